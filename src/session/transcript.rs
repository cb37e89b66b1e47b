//! Ordered chat transcript.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text shown in a bot entry while its reply is pending.
pub const PLACEHOLDER_TEXT: &str = "...";

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The site visitor.
    User,
    /// The chatbot.
    Bot,
}

impl Sender {
    /// CSS modifier class used by the rendered transcript.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the entry.
    pub sender: Sender,
    /// Displayed text.
    pub text: String,
    /// When the entry was appended.
    pub sent_at: DateTime<Utc>,
}

impl Message {
    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }
}

/// Position of a placeholder bot entry, issued when the placeholder is
/// appended and consumed when its reply lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaceholderHandle(usize);

impl PlaceholderHandle {
    /// Transcript index this handle addresses.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Append-only list of messages in display order.
///
/// Entries are never removed or reordered; the only mutation is filling a
/// placeholder through its [`PlaceholderHandle`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Create an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user entry.
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::new(Sender::User, text));
    }

    /// Append a bot entry with final text.
    pub fn push_bot(&mut self, text: impl Into<String>) {
        self.messages.push(Message::new(Sender::Bot, text));
    }

    /// Append a pending bot entry and return its handle.
    pub fn push_placeholder(&mut self) -> PlaceholderHandle {
        let handle = PlaceholderHandle(self.messages.len());
        self.messages.push(Message::new(Sender::Bot, PLACEHOLDER_TEXT));
        handle
    }

    /// Replace the text of the bot entry at `handle`.
    ///
    /// Returns `false` if the handle does not address a bot entry.
    pub fn fill(&mut self, handle: PlaceholderHandle, text: impl Into<String>) -> bool {
        match self.messages.get_mut(handle.0) {
            Some(msg) if msg.sender == Sender::Bot => {
                msg.text = text.into();
                true
            }
            _ => false,
        }
    }

    /// All entries in display order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Most recent entry, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_then_fill() {
        let mut transcript = Transcript::new();
        transcript.push_user("Bonjour");
        let handle = transcript.push_placeholder();

        assert_eq!(handle.index(), 1);
        assert_eq!(transcript.messages()[1].text, PLACEHOLDER_TEXT);

        assert!(transcript.fill(handle, "Salut !"));
        assert_eq!(transcript.messages()[1].text, "Salut !");
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn test_fill_targets_handle_not_last_bot() {
        let mut transcript = Transcript::new();
        let first = transcript.push_placeholder();
        transcript.push_bot("later");

        assert!(transcript.fill(first, "reply"));
        assert_eq!(transcript.messages()[0].text, "reply");
        assert_eq!(transcript.messages()[1].text, "later");
    }

    #[test]
    fn test_fill_rejects_user_entry() {
        let mut transcript = Transcript::new();
        transcript.push_user("hi");
        let bogus = PlaceholderHandle(0);
        assert!(!transcript.fill(bogus, "nope"));
        assert_eq!(transcript.messages()[0].text, "hi");
    }

    #[test]
    fn test_serializes_as_array() {
        let mut transcript = Transcript::new();
        transcript.push_user("hi");
        let v = serde_json::to_value(&transcript).unwrap();
        assert_eq!(v[0]["sender"], "user");
        assert_eq!(v[0]["text"], "hi");
    }
}
