//! Integration tests for POST /universe-chat
//!
//! The AI gateway is mocked with wiremock and universe data comes from an
//! in-memory store, so the tests are hermetic.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use lorekeeper::{
    config::{Config, Credentials},
    handlers::{self, AppState},
    store::{MemoryStore, Table},
    universe::{Character, Event, Location, Relationship, Universe, WorldObject},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config(gateway_url: &str) -> Config {
    let toml = format!(
        r#"
[server]
host = "127.0.0.1"
port = 8080

[store]
url = "http://localhost:54321"

[universe_chat]
base_url = "{}/v1"
model = "test-gateway-model"

[lore_assistant]
base_url = "http://localhost:9001/v1"
model = "test-provider-model"
"#,
        gateway_url
    );
    toml::from_str(&toml).expect("should parse TOML config")
}

fn create_test_app(gateway_url: &str, store: MemoryStore) -> Router {
    let credentials = Credentials {
        gateway_key: Some("gw-key".to_string()),
        ..Default::default()
    };
    let state = AppState::with_store(
        Arc::new(create_test_config(gateway_url)),
        credentials,
        Arc::new(store),
        reqwest::Client::new(),
    )
    .expect("AppState should build");
    handlers::router(state)
}

fn chat_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/universe-chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).expect("response should be JSON")
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    }))
}

/// Messages array of the single request the gateway received
async fn sent_messages(server: &MockServer) -> Vec<Value> {
    let requests = server
        .received_requests()
        .await
        .expect("request recording is enabled");
    assert_eq!(requests.len(), 1, "gateway should be called exactly once");
    let body: Value = serde_json::from_slice(&requests[0].body).expect("JSON body");
    body["messages"].as_array().expect("messages array").clone()
}

fn character(id: &str, name: &str, role: &str, description: &str) -> Character {
    Character {
        id: id.to_string(),
        universe_id: "u1".to_string(),
        name: name.to_string(),
        role: Some(role.to_string()),
        description: Some(description.to_string()),
    }
}

fn event(id: &str, name: &str, position: i64) -> Event {
    Event {
        id: id.to_string(),
        universe_id: "u1".to_string(),
        name: name.to_string(),
        description: None,
        timeline_position: Some(position),
    }
}

#[tokio::test]
async fn test_single_character_is_counted_and_sent_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer gw-key"))
        .respond_with(completion("X is the brave hero."))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryStore::new().with_character(character("c1", "X", "hero", "brave"));
    let app = create_test_app(&server.uri(), store);

    let response = app
        .oneshot(chat_request(r#"{"universe_id":"u1","message":"Who is X?"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["reply"], "X is the brave hero.");
    assert_eq!(body["context_used"]["characters"], 1);
    assert_eq!(body["context_used"]["locations"], 0);

    let messages = sent_messages(&server).await;
    assert_eq!(messages[0]["role"], "system");
    let system = messages[0]["content"].as_str().unwrap();
    assert!(
        system.contains("X (hero) - brave"),
        "system prompt should carry the character summary, got: {}",
        system
    );
    assert_eq!(messages.last().unwrap()["role"], "user");
    assert_eq!(messages.last().unwrap()["content"], "Who is X?");
}

#[tokio::test]
async fn test_empty_universe_reports_zero_counts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("Nothing is recorded yet."))
        .mount(&server)
        .await;

    let app = create_test_app(&server.uri(), MemoryStore::new());

    let response = app
        .oneshot(chat_request(r#"{"universe_id":"empty","message":"Hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["context_used"],
        json!({"characters": 0, "locations": 0, "events": 0, "objects": 0, "relationships": 0})
    );
    assert!(!body["reply"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_choice_uses_fallback_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let app = create_test_app(&server.uri(), MemoryStore::new());

    let response = app
        .oneshot(chat_request(r#"{"universe_id":"u1","message":"Hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["reply"], "I'm sorry, I couldn't generate a response.");
}

#[tokio::test]
async fn test_full_context_sections_and_event_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("ok"))
        .mount(&server)
        .await;

    let store = MemoryStore::new()
        .with_universe(Universe {
            id: "u1".to_string(),
            title: "Aster".to_string(),
            description: Some("A drowned empire".to_string()),
        })
        .with_character(character("c1", "Ana", "captain", "stern"))
        .with_location(Location {
            id: "l1".to_string(),
            universe_id: "u1".to_string(),
            name: "Harbor".to_string(),
            location_type: Some("city".to_string()),
            description: Some("busy".to_string()),
        })
        .with_event(event("e3", "Coronation", 30))
        .with_event(event("e1", "Flood", 10))
        .with_event(event("e2", "Exodus", 20))
        .with_object(WorldObject {
            id: "o1".to_string(),
            universe_id: "u1".to_string(),
            name: "Lantern".to_string(),
            description: None,
            significance: Some("guides ships".to_string()),
        })
        .with_relationship(Relationship {
            id: "r1".to_string(),
            universe_id: "u1".to_string(),
            source_type: "character".to_string(),
            source_id: "c1".to_string(),
            target_type: "location".to_string(),
            target_id: "l1".to_string(),
            relationship_type: "guards".to_string(),
        });
    let app = create_test_app(&server.uri(), store);

    let response = app
        .oneshot(chat_request(r#"{"universe_id":"u1","message":"Summarize"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["context_used"],
        json!({"characters": 1, "locations": 1, "events": 3, "objects": 1, "relationships": 1})
    );

    let messages = sent_messages(&server).await;
    let system = messages[0]["content"].as_str().unwrap();
    assert!(system.contains("\"Aster\""));
    assert!(system.contains("A drowned empire"));
    assert!(system.contains("Locations: Harbor (city) - busy"));
    assert!(system.contains("Events: Flood, Exodus, Coronation"));
    assert!(system.contains("Objects: Lantern (significance: guides ships)"));
    assert!(system.contains("Relationships: Ana guards Harbor"));
}

#[tokio::test]
async fn test_conversation_history_sits_between_system_and_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("ok"))
        .mount(&server)
        .await;

    let app = create_test_app(&server.uri(), MemoryStore::new());

    let body = json!({
        "universe_id": "u1",
        "message": "And then?",
        "conversation_history": [
            {"role": "user", "content": "Tell me a story"},
            {"role": "assistant", "content": "Once upon a time"}
        ]
    });
    let response = app
        .oneshot(chat_request(&body.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let messages = sent_messages(&server).await;
    let roles: Vec<&str> = messages
        .iter()
        .map(|m| m["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    assert_eq!(messages[1]["content"], "Tell me a story");
    assert_eq!(messages[2]["content"], "Once upon a time");
    assert_eq!(messages[3]["content"], "And then?");
}

#[tokio::test]
async fn test_blank_content_uses_fallback_reply() {
    for content in ["", "   \n"] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(completion(content))
            .mount(&server)
            .await;

        let app = create_test_app(&server.uri(), MemoryStore::new());

        let response = app
            .oneshot(chat_request(r#"{"universe_id":"u1","message":"Hello"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(
            body["reply"], "I'm sorry, I couldn't generate a response.",
            "content {:?} should fall back",
            content
        );
    }
}

#[tokio::test]
async fn test_history_with_nonstandard_role_is_forwarded_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let app = create_test_app(&server.uri(), MemoryStore::new());

    let body = json!({
        "universe_id": "u1",
        "message": "Go on",
        "conversation_history": [{"role": "model", "content": "earlier"}]
    });
    let response = app
        .oneshot(chat_request(&body.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let messages = sent_messages(&server).await;
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1]["role"], "model");
    assert_eq!(messages[1]["content"], "earlier");
}

#[tokio::test]
async fn test_store_failures_degrade_to_empty_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("ok"))
        .mount(&server)
        .await;

    let store = MemoryStore::new()
        .with_character(character("c1", "X", "hero", "brave"))
        .failing(Table::Characters)
        .failing(Table::Events);
    let app = create_test_app(&server.uri(), store);

    let response = app
        .oneshot(chat_request(r#"{"universe_id":"u1","message":"Hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["context_used"]["characters"], 0);
    assert_eq!(body["context_used"]["events"], 0);

    let messages = sent_messages(&server).await;
    assert!(
        messages[0]["content"]
            .as_str()
            .unwrap()
            .contains("Characters: None")
    );
}

#[tokio::test]
async fn test_malformed_json_returns_500_without_calling_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("unused"))
        .expect(0)
        .mount(&server)
        .await;

    for bad in ["{not json", "", r#"{"message":"no universe"}"#, "[]"] {
        let app = create_test_app(&server.uri(), MemoryStore::new());
        let response = app.oneshot(chat_request(bad)).await.unwrap();

        assert_eq!(
            response.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "body {:?} should be rejected",
            bad
        );
        let body = body_json(response).await;
        assert!(
            !body["error"].as_str().unwrap_or_default().is_empty(),
            "error should be a non-empty string for body {:?}",
            bad
        );
    }
}

#[tokio::test]
async fn test_gateway_error_status_returns_500() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(402).set_body_string("payment required"))
        .mount(&server)
        .await;

    let app = create_test_app(&server.uri(), MemoryStore::new());

    let response = app
        .oneshot(chat_request(r#"{"universe_id":"u1","message":"Hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("402"));
}

#[tokio::test]
async fn test_gateway_garbage_body_returns_500() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let app = create_test_app(&server.uri(), MemoryStore::new());

    let response = app
        .oneshot(chat_request(r#"{"universe_id":"u1","message":"Hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Unexpected response from ai-gateway")
    );
}
