//! HTTP routes exercised through `axum-test`.

use axum::http::StatusCode;
use axum_test::TestServer;
use datafish_chat::AppState;
use datafish_chat::config::AppConfig;
use datafish_chat::llm::{FALLBACK_ERROR, ReplyError, ReplyProvider};
use datafish_chat::server::router;
use datafish_chat::session::WidgetStore;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Answers "Réponse à: <text>", or a status failure for "panne".
struct Scripted;

#[async_trait::async_trait]
impl ReplyProvider for Scripted {
    async fn try_reply(&self, user_text: &str) -> Result<String, ReplyError> {
        if user_text == "panne" {
            return Err(ReplyError::Status { status: 502 });
        }
        Ok(format!("Réponse à: {user_text}"))
    }
}

/// Holds every reply until the test opens the gate.
struct Gated {
    gate: Arc<Notify>,
}

#[async_trait::async_trait]
impl ReplyProvider for Gated {
    async fn try_reply(&self, user_text: &str) -> Result<String, ReplyError> {
        self.gate.notified().await;
        Ok(format!("Enfin: {user_text}"))
    }
}

fn setup_with(widgets: WidgetStore) -> (TestServer, AppState) {
    let config = AppConfig::load_from_args(["datafish-chat"]).expect("Failed to load config");
    let state = AppState {
        widgets,
        config: Arc::new(config),
    };
    let server = TestServer::new(router(state.clone())).expect("Failed to start test server");
    (server, state)
}

fn setup() -> (TestServer, AppState) {
    setup_with(WidgetStore::new(Arc::new(Scripted)))
}

async fn create_widget(server: &TestServer) -> String {
    let response = server.post("/api/widgets").await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["id"].as_str().expect("widget id").to_string()
}

#[tokio::test]
async fn test_health() {
    let (server, _) = setup();
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"status": "ok"}));
}

#[tokio::test]
async fn test_new_widget_is_closed_and_empty() {
    let (server, _) = setup();
    let response = server.post("/api/widgets").await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(body["visibility"], "closed");
    assert_eq!(body["trigger_visible"], true);
    assert_eq!(body["turn_in_flight"], false);
    assert_eq!(body["messages"], json!([]));
}

#[tokio::test]
async fn test_open_then_close() {
    let (server, _) = setup();
    let id = create_widget(&server).await;

    let opened: Value = server.post(&format!("/api/widgets/{id}/open")).await.json();
    assert_eq!(opened["visibility"], "open");
    assert_eq!(opened["trigger_visible"], false);

    let closed: Value = server.post(&format!("/api/widgets/{id}/close")).await.json();
    assert_eq!(closed["visibility"], "closed");
    assert_eq!(closed["trigger_visible"], true);
}

#[tokio::test]
async fn test_turn_appends_user_and_reply() {
    let (server, _) = setup();
    let id = create_widget(&server).await;

    let response = server
        .post(&format!("/api/widgets/{id}/turns"))
        .json(&json!({"text": "  Bonjour  "}))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["sender"], "user");
    assert_eq!(messages[0]["text"], "  Bonjour  ");
    assert_eq!(messages[1]["sender"], "bot");
    assert_eq!(messages[1]["text"], "Réponse à: Bonjour");
    assert_eq!(body["turn_in_flight"], false);
}

#[tokio::test]
async fn test_failed_reply_shows_fallback() {
    let (server, _) = setup();
    let id = create_widget(&server).await;

    let body: Value = server
        .post(&format!("/api/widgets/{id}/turns"))
        .json(&json!({"text": "panne"}))
        .await
        .json();
    assert_eq!(body["messages"][1]["text"], FALLBACK_ERROR);
}

#[tokio::test]
async fn test_blank_turn_is_noop() {
    let (server, _) = setup();
    let id = create_widget(&server).await;

    let response = server
        .post(&format!("/api/widgets/{id}/turns"))
        .json(&json!({"text": " \t "}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["messages"], json!([]));
}

#[tokio::test]
async fn test_turn_rejected_while_previous_pending() {
    let (server, state) = setup();
    let id = create_widget(&server).await;

    let widget = state.widgets.get(&id).await.unwrap();
    let pending = widget
        .lock()
        .await
        .begin_turn("première question")
        .unwrap()
        .unwrap();

    let response = server
        .post(&format!("/api/widgets/{id}/turns"))
        .json(&json!({"text": "deuxième question"}))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert!(response.json::<Value>()["error"].is_string());

    let snapshot: Value = server.get(&format!("/api/widgets/{id}")).await.json();
    assert_eq!(snapshot["messages"].as_array().unwrap().len(), 2);
    assert_eq!(snapshot["turn_in_flight"], true);

    widget.lock().await.complete_turn(pending, "ok").unwrap();
    server
        .post(&format!("/api/widgets/{id}/turns"))
        .json(&json!({"text": "deuxième question"}))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_unknown_widget_is_not_found() {
    let (server, _) = setup();
    server
        .get("/api/widgets/does-not-exist")
        .await
        .assert_status_not_found();
    server
        .post("/api/widgets/does-not-exist/open")
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_html_fragment() {
    let (server, _) = setup();
    let id = create_widget(&server).await;

    let html = server
        .post(&format!("/api/widgets/{id}/open"))
        .add_query_param("format", "html")
        .await
        .text();
    assert!(html.contains(r#"id="chatbot-window" style="display:flex""#));

    server
        .post(&format!("/api/widgets/{id}/turns"))
        .json(&json!({"text": "<script>"}))
        .await
        .assert_status_ok();

    let fragment = server.get(&format!("/api/widgets/{id}/fragment")).await.text();
    assert!(fragment.contains(r#"<div id="chatbot-messages">"#));
    assert!(fragment.contains(r#"<div class="chatbot-message user">&lt;script&gt;</div>"#));
    assert!(!fragment.contains("<script>"));
}

#[tokio::test]
async fn test_index_page_embeds_new_widget() {
    let (server, state) = setup();
    let response = server.get("/").await;
    response.assert_status_ok();
    assert!(response.text().contains(r#"id="chatbot-button""#));
    assert_eq!(state.widgets.len().await, 1);
}

#[tokio::test]
async fn test_chat_proxy() {
    let (server, _) = setup();

    let response = server
        .post("/api/chat")
        .json(&json!({"message": " Bonjour "}))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({"reply": "Réponse à: Bonjour"})
    );

    server
        .post("/api/chat")
        .json(&json!({"message": "   "}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_widget() {
    let (server, state) = setup();
    let id = create_widget(&server).await;

    server
        .delete(&format!("/api/widgets/{id}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert!(state.widgets.is_empty().await);

    server
        .get(&format!("/api/widgets/{id}"))
        .await
        .assert_status_not_found();
    server
        .delete(&format!("/api/widgets/{id}"))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_page_loads_do_not_grow_store_past_cap() {
    let store = WidgetStore::with_limits(Arc::new(Scripted), Duration::from_secs(3600), 3);
    let (server, state) = setup_with(store);

    for _ in 0..20 {
        server.get("/").await.assert_status_ok();
    }
    assert_eq!(state.widgets.len().await, 3);
}

#[tokio::test]
async fn test_html_turn_shows_placeholder_until_reply() {
    let gate = Arc::new(Notify::new());
    let store = WidgetStore::new(Arc::new(Gated {
        gate: Arc::clone(&gate),
    }));
    let (server, _) = setup_with(store);
    let id = create_widget(&server).await;

    let html = server
        .post(&format!("/api/widgets/{id}/turns"))
        .add_query_param("format", "html")
        .json(&json!({"text": "Bonjour"}))
        .await
        .text();
    assert!(html.contains(r#"<div class="chatbot-message user">Bonjour</div>"#));
    assert!(html.contains(r#"chatbot-message bot">...</div>"#));
    assert!(html.contains(&format!(
        r#"hx-get="/api/widgets/{id}/fragment" hx-trigger="every 1s""#
    )));
    assert!(html.contains("<button type=\"submit\" disabled>"));

    gate.notify_one();

    let mut settled = String::new();
    for _ in 0..100 {
        settled = server.get(&format!("/api/widgets/{id}/fragment")).await.text();
        if !settled.contains("hx-trigger") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(settled.contains(r#"<div class="chatbot-message bot">Enfin: Bonjour</div>"#));
    assert!(!settled.contains("hx-trigger"));
    assert!(!settled.contains("disabled"));
}
