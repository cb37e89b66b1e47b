//! Chat widget state and storage.
//!
//! This module holds everything the chatbot widget knows about itself: the
//! open/closed panel state, the ordered transcript, and the single turn that
//! may be awaiting a reply.
//!
//! # Architecture
//!
//! - [`Transcript`]: append-only message list with placeholder handles
//! - [`ChatWidget`]: visibility, transcript, turn guard
//! - [`WidgetStore`]: shared map of live widgets for the HTTP layer
//!
//! # Example
//!
//! ```rust
//! use datafish_chat::session::Transcript;
//!
//! let mut transcript = Transcript::new();
//! transcript.push_user("Bonjour");
//! let pending = transcript.push_placeholder();
//! transcript.fill(pending, "Bonjour ! Comment puis-je vous aider ?");
//!
//! assert_eq!(transcript.len(), 2);
//! ```

mod store;
mod transcript;
mod widget;

pub use store::{DEFAULT_IDLE_TTL, DEFAULT_MAX_WIDGETS, SharedWidget, WidgetStore};
pub use transcript::{Message, PLACEHOLDER_TEXT, PlaceholderHandle, Sender, Transcript};
pub use widget::{ChatWidget, PendingTurn, TurnOutcome, Visibility, WidgetError, WidgetSnapshot};
