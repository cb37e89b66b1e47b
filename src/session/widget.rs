//! Chat widget state: panel visibility, transcript and the turn in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use super::transcript::{Message, PlaceholderHandle, Transcript};
use crate::llm::ReplyProvider;

/// Whether the chat panel is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Panel hidden, trigger button shown.
    #[default]
    Closed,
    /// Panel shown, trigger button hidden.
    Open,
}

/// Rejections from the turn guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WidgetError {
    /// A previous turn is still waiting for its reply.
    #[error("a reply is still pending for the previous message")]
    TurnInFlight,
    /// The pending turn does not belong to this widget's outstanding placeholder.
    #[error("no pending placeholder at transcript index {0}")]
    UnknownPlaceholder(usize),
}

static NEXT_TURN_ID: AtomicU64 = AtomicU64::new(1);

/// A turn whose placeholder is in the transcript and whose reply is awaited.
///
/// Returned by [`ChatWidget::begin_turn`] and consumed by
/// [`ChatWidget::complete_turn`].
#[derive(Debug)]
#[must_use = "a pending turn blocks new submissions until completed"]
pub struct PendingTurn {
    id: u64,
    handle: PlaceholderHandle,
    text: String,
}

impl PendingTurn {
    /// The placeholder this turn will fill.
    pub fn handle(&self) -> PlaceholderHandle {
        self.handle
    }

    /// The trimmed user text to send to the reply provider.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Result of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input; nothing was appended.
    Ignored,
    /// The placeholder at the handle now holds the reply.
    Replied(PlaceholderHandle),
}

/// Serializable view of a widget.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetSnapshot {
    /// Panel state.
    pub visibility: Visibility,
    /// Whether the trigger button is shown.
    pub trigger_visible: bool,
    /// A reply is pending; new submissions are rejected.
    pub turn_in_flight: bool,
    /// Transcript entries, oldest first.
    pub messages: Vec<Message>,
}

/// The site chatbot widget.
///
/// Owns the transcript and the visibility state; bot replies come from the
/// injected [`ReplyProvider`]. At most one turn is in flight at a time.
pub struct ChatWidget {
    provider: Arc<dyn ReplyProvider>,
    visibility: Visibility,
    transcript: Transcript,
    input: String,
    /// Turn id and placeholder of the outstanding turn.
    in_flight: Option<(u64, PlaceholderHandle)>,
}

impl std::fmt::Debug for ChatWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatWidget")
            .field("visibility", &self.visibility)
            .field("transcript", &self.transcript)
            .field("input", &self.input)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl ChatWidget {
    /// Create a closed widget with an empty transcript.
    #[must_use]
    pub fn new(provider: Arc<dyn ReplyProvider>) -> Self {
        Self {
            provider,
            visibility: Visibility::Closed,
            transcript: Transcript::new(),
            input: String::new(),
            in_flight: None,
        }
    }

    /// Show the panel and hide the trigger.
    pub fn open(&mut self) {
        self.visibility = Visibility::Open;
    }

    /// Hide the panel and show the trigger.
    pub fn close(&mut self) {
        self.visibility = Visibility::Closed;
    }

    /// Current panel state.
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether the panel is shown.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.visibility == Visibility::Open
    }

    /// The trigger button is shown exactly when the panel is not.
    #[must_use]
    pub fn trigger_visible(&self) -> bool {
        !self.is_open()
    }

    /// The conversation so far, including any pending placeholder.
    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Whether a reply is still awaited.
    #[must_use]
    pub fn is_turn_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Current contents of the text input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the contents of the text input.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Shared handle to the reply provider, for callers that await replies
    /// outside the widget's lock.
    #[must_use]
    pub fn provider(&self) -> Arc<dyn ReplyProvider> {
        Arc::clone(&self.provider)
    }

    /// Start a turn: append the user entry, clear the input, append the
    /// placeholder.
    ///
    /// Returns `Ok(None)` without touching anything when `user_text` is blank.
    ///
    /// # Errors
    ///
    /// [`WidgetError::TurnInFlight`] if the previous turn has not completed.
    pub fn begin_turn(&mut self, user_text: &str) -> Result<Option<PendingTurn>, WidgetError> {
        let trimmed = user_text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if self.in_flight.is_some() {
            return Err(WidgetError::TurnInFlight);
        }

        self.transcript.push_user(user_text);
        self.input.clear();
        let handle = self.transcript.push_placeholder();
        let id = NEXT_TURN_ID.fetch_add(1, Ordering::Relaxed);
        self.in_flight = Some((id, handle));

        Ok(Some(PendingTurn {
            id,
            handle,
            text: trimmed.to_string(),
        }))
    }

    /// Finish a turn by writing `reply` into its placeholder.
    ///
    /// # Errors
    ///
    /// [`WidgetError::UnknownPlaceholder`] if `pending` is not this widget's
    /// outstanding turn.
    pub fn complete_turn(
        &mut self,
        pending: PendingTurn,
        reply: impl Into<String>,
    ) -> Result<PlaceholderHandle, WidgetError> {
        let handle = pending.handle;
        if self.in_flight != Some((pending.id, handle)) || !self.transcript.fill(handle, reply) {
            return Err(WidgetError::UnknownPlaceholder(handle.index()));
        }
        self.in_flight = None;
        Ok(handle)
    }

    /// Run one full turn against the reply provider.
    ///
    /// # Errors
    ///
    /// Only the turn guard's rejections; reply failures surface as fallback
    /// text in the transcript.
    pub async fn submit_turn(&mut self, user_text: &str) -> Result<TurnOutcome, WidgetError> {
        let Some(pending) = self.begin_turn(user_text)? else {
            return Ok(TurnOutcome::Ignored);
        };
        let reply = self.provider.get_reply(pending.text()).await;
        let handle = self.complete_turn(pending, reply)?;
        Ok(TurnOutcome::Replied(handle))
    }

    /// Submit whatever is in the text input.
    pub async fn submit_input(&mut self) -> Result<TurnOutcome, WidgetError> {
        let text = self.input.clone();
        self.submit_turn(&text).await
    }

    /// Copy out the serializable state.
    #[must_use]
    pub fn snapshot(&self) -> WidgetSnapshot {
        WidgetSnapshot {
            visibility: self.visibility,
            trigger_visible: self.trigger_visible(),
            turn_in_flight: self.is_turn_in_flight(),
            messages: self.transcript.messages().to_vec(),
        }
    }
}
