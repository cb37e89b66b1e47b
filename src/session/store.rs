//! In-memory widget storage for the HTTP layer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use uuid::Uuid;

use super::widget::ChatWidget;
use crate::llm::ReplyProvider;

/// A widget shared between concurrent requests.
pub type SharedWidget = Arc<Mutex<ChatWidget>>;

/// Widgets untouched for this long are dropped on the next sweep.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

/// Upper bound on live widgets.
pub const DEFAULT_MAX_WIDGETS: usize = 10_000;

#[derive(Debug)]
struct Entry {
    widget: SharedWidget,
    last_used: Instant,
}

impl Entry {
    fn is_stale(&self, now: Instant, idle_ttl: Duration) -> bool {
        now.duration_since(self.last_used) > idle_ttl
    }
}

/// Thread-safe store of live widgets, keyed by UUID.
///
/// Nothing is persisted. Each `create` first drops widgets idle for longer
/// than the TTL, then the least recently used ones while the store is full.
#[derive(Clone)]
pub struct WidgetStore {
    provider: Arc<dyn ReplyProvider>,
    widgets: Arc<RwLock<HashMap<String, Entry>>>,
    idle_ttl: Duration,
    max_widgets: usize,
}

impl std::fmt::Debug for WidgetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetStore")
            .field("idle_ttl", &self.idle_ttl)
            .field("max_widgets", &self.max_widgets)
            .finish_non_exhaustive()
    }
}

impl WidgetStore {
    /// Create an empty store whose widgets reply through `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn ReplyProvider>) -> Self {
        Self::with_limits(provider, DEFAULT_IDLE_TTL, DEFAULT_MAX_WIDGETS)
    }

    /// Create an empty store with explicit eviction limits.
    ///
    /// `max_widgets` is clamped to at least one.
    #[must_use]
    pub fn with_limits(
        provider: Arc<dyn ReplyProvider>,
        idle_ttl: Duration,
        max_widgets: usize,
    ) -> Self {
        Self {
            provider,
            widgets: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
            max_widgets: max_widgets.max(1),
        }
    }

    /// The provider handed to every widget this store creates.
    #[must_use]
    pub fn provider(&self) -> Arc<dyn ReplyProvider> {
        Arc::clone(&self.provider)
    }

    /// Create a new closed widget and return its id.
    pub async fn create(&self) -> (String, SharedWidget) {
        let id = Uuid::new_v4().to_string();
        let widget = Arc::new(Mutex::new(ChatWidget::new(self.provider())));
        let now = Instant::now();

        let mut widgets = self.widgets.write().await;
        let before = widgets.len();
        widgets.retain(|_, entry| !entry.is_stale(now, self.idle_ttl));
        while widgets.len() >= self.max_widgets {
            let Some(oldest) = widgets
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            widgets.remove(&oldest);
        }
        let evicted = before - widgets.len();
        if evicted > 0 {
            tracing::debug!(name: "widget.evicted", count = evicted, "Evicted widgets");
        }

        widgets.insert(
            id.clone(),
            Entry {
                widget: Arc::clone(&widget),
                last_used: now,
            },
        );
        (id, widget)
    }

    /// Get a widget by id and mark it as used.
    pub async fn get(&self, id: &str) -> Option<SharedWidget> {
        let mut widgets = self.widgets.write().await;
        let entry = widgets.get_mut(id)?;
        entry.last_used = Instant::now();
        Some(Arc::clone(&entry.widget))
    }

    /// Remove a widget by id.
    pub async fn remove(&self, id: &str) -> Option<SharedWidget> {
        self.widgets.write().await.remove(id).map(|entry| entry.widget)
    }

    /// Number of live widgets.
    pub async fn len(&self) -> usize {
        self.widgets.read().await.len()
    }

    /// Whether no widget is live.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
