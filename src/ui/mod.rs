//! Server-rendered HTML for the chatbot widget.
//!
//! The page embeds the widget markup once; HTMX then swaps in the fragment
//! returned by each widget action.
//!
//! # Element ids
//!
//! The markup keeps the fixed ids the site stylesheet targets:
//! `chatbot-button`, `chatbot-window`, `chatbot-close`, `chatbot-form`,
//! `chatbot-input` and `chatbot-messages`.

pub mod page;
pub mod widget;

pub use page::page;
pub use widget::{escape_html, render_widget};
