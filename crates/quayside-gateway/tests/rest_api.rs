//! REST surface tests.

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::Value;
use tempfile::TempDir;

use chrono::Utc;
use quayside_core::{MessageId, SessionId, UserId};
use quayside_gateway::{create_router, ConnectionRegistry, GatewayConfig, GatewayState};
use quayside_routing::RoutingEngine;
use quayside_store::{ChatSession, Message, RocksStore, Sender, SessionStatus, Store};

fn test_server() -> (TestServer, Arc<RocksStore>, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(RocksStore::open(dir.path()).unwrap());
    let connections = Arc::new(ConnectionRegistry::new());
    let engine = Arc::new(RoutingEngine::with_defaults(
        Arc::clone(&store),
        Arc::clone(&connections),
    ));
    let state = GatewayState::new(engine, Arc::clone(&store), connections, GatewayConfig::default());
    let server = TestServer::new(create_router(state)).unwrap();
    (server, store, dir)
}

fn seed_session(store: &RocksStore, user_name: &str) -> ChatSession {
    let now = Utc::now();
    let session = ChatSession {
        session_id: SessionId::generate(),
        user_id: UserId::from_uuid(uuid::Uuid::new_v4()),
        user_name: user_name.to_string(),
        user_email: format!("{}@example.com", user_name.to_lowercase()),
        status: SessionStatus::Waiting,
        agent_id: None,
        agent_name: None,
        started_at: now,
        closed_at: None,
        last_message_at: now,
        message_count: 0,
    };
    store.put_session(&session).unwrap();
    session
}

#[tokio::test]
async fn health_endpoint() {
    let (server, _store, _dir) = test_server();

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn list_and_get_sessions() {
    let (server, store, _dir) = test_server();
    let session = seed_session(&store, "Ayşe");

    let response = server.get("/v1/sessions").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["sessions"].as_array().unwrap().len(), 1);

    let response = server
        .get(&format!("/v1/sessions/{}", session.session_id))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["user_name"], "Ayşe");
    assert_eq!(body["status"], "waiting");
    assert_eq!(body["message_count"], 0);
}

#[tokio::test]
async fn status_filter() {
    let (server, store, _dir) = test_server();
    seed_session(&store, "Ayşe");

    let response = server.get("/v1/sessions").add_query_param("status", "waiting").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["sessions"].as_array().unwrap().len(), 1);

    let response = server.get("/v1/sessions").add_query_param("status", "closed").await;
    let body: Value = response.json();
    assert!(body["sessions"].as_array().unwrap().is_empty());

    let response = server.get("/v1/sessions").add_query_param("status", "bogus").await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn transcript_endpoint_uses_wire_shape() {
    let (server, store, _dir) = test_server();
    let session = seed_session(&store, "Ayşe");

    let message = Message {
        message_id: MessageId::generate(),
        session_id: session.session_id,
        sender: Sender::User,
        sender_name: "Ayşe".into(),
        text: "Merhaba".into(),
        timestamp: Utc::now(),
    };
    store.append_message(&message).unwrap();

    let response = server
        .get(&format!("/v1/sessions/{}/messages", session.session_id))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["_id"], message.message_id.to_string());
    assert_eq!(messages[0]["senderName"], "Ayşe");
}

#[tokio::test]
async fn missing_session_is_404() {
    let (server, _store, _dir) = test_server();

    let response = server
        .get(&format!("/v1/sessions/{}", SessionId::generate()))
        .await;
    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "not_found");

    let response = server.get("/v1/sessions/not-a-uuid").await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn admin_close() {
    let (server, store, _dir) = test_server();
    let session = seed_session(&store, "Ayşe");

    let response = server
        .delete(&format!("/v1/sessions/{}", session.session_id))
        .await;
    assert_eq!(response.status_code(), 204);

    let closed = store.get_session(&session.session_id).unwrap().unwrap();
    assert_eq!(closed.status, SessionStatus::Closed);
    assert!(closed.closed_at.is_some());

    // A second close is a conflict
    let response = server
        .delete(&format!("/v1/sessions/{}", session.session_id))
        .await;
    assert_eq!(response.status_code(), 409);
}
