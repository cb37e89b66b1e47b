use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tower_http::trace::TraceLayer;

use tracing::info;

use crate::AppState;
use crate::config::AppConfig;
use crate::llm::ReplyProvider;
use crate::session::{ChatWidget, WidgetError, WidgetSnapshot, WidgetStore};
use crate::ui;

/// Request bodies are small JSON documents.
const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Stand-in budget when the timeout middleware is disabled.
const UNBOUNDED_TIMEOUT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Start the Axum server with the provided configuration and reply provider.
pub async fn start_server(
    config: Arc<AppConfig>,
    provider: Arc<dyn ReplyProvider>,
) -> anyhow::Result<()> {
    let state = AppState {
        widgets: WidgetStore::with_limits(
            provider,
            config.widget_idle_ttl(),
            config.server.max_widgets,
        ),
        config: Arc::clone(&config),
    };

    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let timeout = state.config.request_timeout().unwrap_or(UNBOUNDED_TIMEOUT);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/chat", post(api_chat))
        .route("/api/widgets", post(create_widget))
        .route("/api/widgets/{id}", get(get_widget).delete(delete_widget))
        .route("/api/widgets/{id}/open", post(open_widget))
        .route("/api/widgets/{id}/close", post(close_widget))
        .route("/api/widgets/{id}/turns", post(submit_turn))
        .route("/api/widgets/{id}/fragment", get(widget_fragment))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response(),
                }
            },
        ))
        .with_state(state)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Handler failures, rendered as `{"error": ...}` with a matching status.
#[derive(Debug)]
enum ApiError {
    BadRequest(&'static str),
    NotFound,
    Conflict(WidgetError),
    Internal(String),
}

impl From<WidgetError> for ApiError {
    fn from(e: WidgetError) -> Self {
        match e {
            WidgetError::TurnInFlight => Self::Conflict(e),
            WidgetError::UnknownPlaceholder(_) => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m.to_string()),
            Self::NotFound => (StatusCode::NOT_FOUND, "widget not found".to_string()),
            Self::Conflict(e) => (StatusCode::CONFLICT, e.to_string()),
            Self::Internal(m) => {
                tracing::error!(error = %m, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, m)
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pages
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - Page shell with a fresh widget.
async fn index(State(state): State<AppState>) -> Html<String> {
    let (id, widget) = state.widgets.create().await;
    let widget = widget.lock().await;
    Html(ui::page(&ui::render_widget(&id, &widget)))
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Proxy
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for the chat proxy.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    /// User message content.
    message: String,
}

/// Response from the chat proxy.
#[derive(Debug, Serialize)]
struct ChatReply {
    reply: String,
}

/// POST /api/chat - One stateless turn; the credential never leaves the server.
async fn api_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("message cannot be empty"));
    }

    let started = Instant::now();
    let reply = state.widgets.provider().get_reply(message).await;

    info!(
        name: "chat.proxy.completed",
        latency_ms = elapsed_ms(started),
        "Proxied chat turn"
    );

    Ok(Json(ChatReply { reply }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Widgets
// ─────────────────────────────────────────────────────────────────────────────

/// `?format=html` selects the HTML fragment instead of JSON.
#[derive(Debug, Default, Deserialize)]
struct FormatQuery {
    #[serde(default)]
    format: Option<String>,
}

impl FormatQuery {
    fn wants_html(&self) -> bool {
        self.format.as_deref() == Some("html")
    }
}

/// Widget DTO for API responses.
#[derive(Debug, Serialize)]
struct WidgetDto {
    id: String,
    #[serde(flatten)]
    snapshot: WidgetSnapshot,
}

fn view(id: &str, widget: &ChatWidget, format: &FormatQuery) -> Response {
    if format.wants_html() {
        Html(ui::render_widget(id, widget)).into_response()
    } else {
        Json(WidgetDto {
            id: id.to_string(),
            snapshot: widget.snapshot(),
        })
        .into_response()
    }
}

/// POST /api/widgets - Create a closed widget.
async fn create_widget(State(state): State<AppState>) -> Response {
    let (id, widget) = state.widgets.create().await;
    info!(name: "widget.created", widget_id = %id, "Widget created");

    let widget = widget.lock().await;
    let dto = WidgetDto {
        id,
        snapshot: widget.snapshot(),
    };
    (StatusCode::CREATED, Json(dto)).into_response()
}

/// GET /api/widgets/:id
async fn get_widget(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(format): Query<FormatQuery>,
) -> Result<Response, ApiError> {
    let widget = state.widgets.get(&id).await.ok_or(ApiError::NotFound)?;
    let widget = widget.lock().await;
    Ok(view(&id, &widget, &format))
}

/// DELETE /api/widgets/:id - Drop a widget and its transcript.
async fn delete_widget(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.widgets.remove(&id).await.ok_or(ApiError::NotFound)?;
    info!(name: "widget.removed", widget_id = %id, "Widget removed");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/widgets/:id/open
async fn open_widget(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(format): Query<FormatQuery>,
) -> Result<Response, ApiError> {
    let widget = state.widgets.get(&id).await.ok_or(ApiError::NotFound)?;
    let mut widget = widget.lock().await;
    widget.open();
    Ok(view(&id, &widget, &format))
}

/// POST /api/widgets/:id/close
async fn close_widget(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(format): Query<FormatQuery>,
) -> Result<Response, ApiError> {
    let widget = state.widgets.get(&id).await.ok_or(ApiError::NotFound)?;
    let mut widget = widget.lock().await;
    widget.close();
    Ok(view(&id, &widget, &format))
}

/// GET /api/widgets/:id/fragment
async fn widget_fragment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let widget = state.widgets.get(&id).await.ok_or(ApiError::NotFound)?;
    let widget = widget.lock().await;
    Ok(Html(ui::render_widget(&id, &widget)))
}

/// Request body for a widget turn.
#[derive(Debug, Deserialize)]
struct TurnRequest {
    text: String,
}

/// POST /api/widgets/:id/turns - Start one turn.
///
/// The reply is awaited in its own task with the widget lock released, so a
/// dropped connection cannot strand the placeholder. HTML callers get the
/// widget back at once with the placeholder showing and poll the fragment
/// until the reply lands; JSON callers get the completed turn.
async fn submit_turn(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(format): Query<FormatQuery>,
    Json(req): Json<TurnRequest>,
) -> Result<Response, ApiError> {
    let widget = state.widgets.get(&id).await.ok_or(ApiError::NotFound)?;

    let mut guard = widget.lock().await;
    let Some(pending) = guard.begin_turn(&req.text)? else {
        return Ok(view(&id, &guard, &format));
    };
    let provider = guard.provider();

    let task_widget = Arc::clone(&widget);
    let widget_id = id.clone();
    let completion = tokio::spawn(async move {
        let started = Instant::now();
        let reply = provider.get_reply(pending.text()).await;
        let handle = task_widget.lock().await.complete_turn(pending, reply)?;
        info!(
            name: "chat.turn.completed",
            widget_id = %widget_id,
            placeholder = handle.index(),
            latency_ms = elapsed_ms(started),
            "Turn completed"
        );
        Ok::<_, WidgetError>(())
    });

    if format.wants_html() {
        return Ok(view(&id, &guard, &format));
    }
    drop(guard);

    completion
        .await
        .map_err(|e| ApiError::Internal(format!("turn task failed: {e}")))??;

    let widget = widget.lock().await;
    Ok(view(&id, &widget, &format))
}
