//! Datafish site chatbot
//!
//! Server side of the marketing site's chat widget: it keeps each widget's
//! transcript, forwards user turns to a chat-completion API with the bearer
//! credential held server-side, and renders the widget as HTML for HTMX.
//!
//! # Architecture
//!
//! - **Server**: Axum-based HTTP server (proxy, widget API, HTML fragments)
//! - **Reply provider**: single-shot Chat Completions client with French fallbacks
//! - **UI**: server-rendered markup + HTMX
//!
//! # Modules
//!
//! - [`config`]: layered configuration (defaults, file, env, CLI)
//! - [`llm`]: reply provider contract and implementation
//! - [`session`]: widget state, transcript and widget store
//! - [`server`]: HTTP routes and middleware
//! - [`ui`]: widget and page markup

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod llm;
pub mod server;
pub mod session;
pub mod ui;

use crate::config::AppConfig;

use session::WidgetStore;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Live chat widgets and their reply provider.
    pub widgets: WidgetStore,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}
