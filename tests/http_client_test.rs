//! HTTP conversation client integration tests
//!
//! Runs `HttpConversationClient` against a `wiremock` server and checks the
//! request shape and the mapping of responses onto the error taxonomy.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sponsorchat::auth::StaticTokenSource;
use sponsorchat::client::{ConversationClient, HttpConversationClient};
use sponsorchat::config::ApiConfig;
use sponsorchat::error::ChatError;
use sponsorchat::session::{
    InitOutcome, Role, SendOutcome, SessionController, SurfaceProfile,
};
use sponsorchat::storage::MemorySessionStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_client(server: &MockServer, tokens: Arc<StaticTokenSource>) -> HttpConversationClient {
    let config = ApiConfig {
        base_url: format!("{}/api", server.uri()),
        timeout_seconds: 5,
    };
    HttpConversationClient::new(&config, tokens).expect("valid client")
}

fn signed_in() -> Arc<StaticTokenSource> {
    Arc::new(StaticTokenSource::new("test-token"))
}

fn assistant_body(id: serde_json::Value, content: &str) -> serde_json::Value {
    json!({
        "assistant_message": {
            "id": id,
            "role": "assistant",
            "content": content,
            "created_at": "2026-01-05T10:00:00Z"
        }
    })
}

// ---------------------------------------------------------------------------
// Conversation endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_create_conversation_sends_bearer_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/conversations"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({"title": "AI Assistant", "mode": "agentic"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"conversation": {"id": 42}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = make_client(&server, signed_in());
    let id = client
        .create_conversation("AI Assistant", "agentic")
        .await
        .expect("create should succeed");

    assert_eq!(id, "42");
}

#[tokio::test]
async fn test_conversation_exists_maps_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/conversations/live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "live"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/conversations/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = make_client(&server, signed_in());
    assert!(client.conversation_exists("live").await.unwrap());
    assert!(!client.conversation_exists("gone").await.unwrap());
}

#[tokio::test]
async fn test_post_message_returns_assistant_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/conversations/c1/messages"))
        .and(body_json(json!({"message": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(assistant_body(json!(7), "hi!")))
        .expect(1)
        .mount(&server)
        .await;

    let client = make_client(&server, signed_in());
    let reply = client.post_message("c1", "hello").await.unwrap();

    assert_eq!(reply.id, "7");
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, "hi!");
}

#[tokio::test]
async fn test_post_message_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/conversations/c1/messages"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Conversation not found"})),
        )
        .mount(&server)
        .await;

    let client = make_client(&server, signed_in());
    let err = client.post_message("c1", "hello").await.unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = make_client(&server, signed_in());
    let err = client.post_message("c1", "hello").await.unwrap_err();

    assert!(matches!(err, ChatError::BackendUnavailable(_)));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_rejected_credential_notifies_token_source() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let tokens = signed_in();
    let client = make_client(&server, tokens.clone());
    let err = client.create_conversation("t", "m").await.unwrap_err();

    assert!(matches!(err, ChatError::Unauthorized(_)));
    assert_eq!(tokens.rejections(), 1);
}

#[tokio::test]
async fn test_signed_out_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = make_client(&server, Arc::new(StaticTokenSource::signed_out()));
    let err = client.post_message("c1", "hello").await.unwrap_err();

    assert!(matches!(err, ChatError::Unauthorized(_)));
}

// ---------------------------------------------------------------------------
// Quick messages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_quick_message_success() {
    let server = MockServer::start().await;
    let mut body = assistant_body(json!("q-1"), "quick answer");
    body["success"] = json!(true);
    Mock::given(method("POST"))
        .and(path("/api/chat/quick"))
        .and(body_json(json!({"message": "quick question"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = make_client(&server, signed_in());
    let reply = client.quick_message("quick question").await.unwrap();

    assert_eq!(reply.id, "q-1");
    assert_eq!(reply.content, "quick answer");
}

#[tokio::test]
async fn test_quick_message_unsuccessful_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/quick"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .mount(&server)
        .await;

    let client = make_client(&server, signed_in());
    let err = client.quick_message("hi").await.unwrap_err();

    assert!(matches!(err, ChatError::BackendUnavailable(_)));
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_controller_recovers_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/conversations"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"conversation": {"id": "old"}})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/conversations"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"conversation": {"id": "new"}})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/conversations/old/messages"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/conversations/new/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(assistant_body(json!(1), "welcome back")))
        .expect(1)
        .mount(&server)
        .await;

    let client = Arc::new(make_client(&server, signed_in()));
    let controller = SessionController::new(
        SurfaceProfile::agentic(),
        client,
        Arc::new(MemorySessionStore::new()),
    );

    assert_eq!(controller.initialize().await, InitOutcome::Created);
    assert_eq!(controller.conversation_id().as_deref(), Some("old"));

    let outcome = controller.send("hello").await;
    assert!(matches!(outcome, SendOutcome::Committed(ref m) if m.content == "welcome back"));
    assert_eq!(controller.conversation_id().as_deref(), Some("new"));

    let messages = controller.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(
        messages
            .iter()
            .filter(|m| m.role == Role::User)
            .count(),
        1
    );
}
