//! API endpoint integration tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use haven::api::{ApiServer, ApiState};
use haven::api::chat::MAX_INPUT_CHARS;
use haven::emotion::{EmotionAnnotator, EmotionScore};
use haven::persona::GREETING;
use serde_json::Value;
use tower::ServiceExt;

mod common;
use common::{ScriptedBackend, annotator, controller};

/// Build a test API router over a scripted backend
fn build_test_router(backend: ScriptedBackend, annotator: EmotionAnnotator) -> axum::Router {
    let controller = controller(Arc::new(backend), annotator);
    ApiServer::new(ApiState::new(controller), 0).router()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router(ScriptedBackend::new(), EmotionAnnotator::disabled());

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_page_is_served() {
    let app = build_test_router(ScriptedBackend::new(), EmotionAnnotator::disabled());

    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));
}

#[tokio::test]
async fn test_empty_history_has_greeting() {
    let app = build_test_router(ScriptedBackend::new(), EmotionAnnotator::disabled());

    let response = app.oneshot(get("/api/history")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["greeting"], GREETING);
    assert_eq!(json["entries"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_chat_records_turn() {
    let backend = ScriptedBackend::new().reply("I'm sorry to hear that. What's worrying you?");
    let scores = vec![EmotionScore::new("fear", 0.91), EmotionScore::new("sadness", 0.05)];
    let app = build_test_router(backend, annotator(scores));

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/chat",
            &serde_json::json!({ "text": "I feel anxious today" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["outcome"], "completed");
    assert_eq!(json["origin"], "typed");
    assert_eq!(json["reply"], "I'm sorry to hear that. What's worrying you?");
    assert_eq!(json["emotions"][0]["label"], "fear");
    assert_eq!(json["spoken"], false);

    let response = app.oneshot(get("/api/history")).await.unwrap();
    let json = body_json(response).await;
    assert!(json.get("greeting").is_none());

    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["speaker"], "user");
    assert_eq!(entries[0]["label"], "You");
    assert_eq!(entries[0]["text"], "I feel anxious today");
    assert_eq!(entries[1]["speaker"], "bot");
    assert_eq!(entries[1]["label"], "Bot");
}

#[tokio::test]
async fn test_blank_chat_is_ignored() {
    let app = build_test_router(ScriptedBackend::new(), EmotionAnnotator::disabled());

    let response = app
        .clone()
        .oneshot(post_json("/api/chat", &serde_json::json!({ "text": "   " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["outcome"], "ignored");

    let response = app.oneshot(get("/api/history")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["entries"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_oversized_chat_is_rejected() {
    let app = build_test_router(ScriptedBackend::new(), EmotionAnnotator::disabled());
    let text = "a".repeat(MAX_INPUT_CHARS + 1);

    let response = app
        .oneshot(post_json("/api/chat", &serde_json::json!({ "text": text })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_speak_without_voice_is_unavailable() {
    let app = build_test_router(ScriptedBackend::new(), EmotionAnnotator::disabled());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/speak")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "not_configured");
}

#[tokio::test]
async fn test_status_endpoint() {
    let app = build_test_router(ScriptedBackend::new(), EmotionAnnotator::disabled());

    let response = app.oneshot(get("/api/status")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["model"], "scripted");
    assert_eq!(json["busy"], false);
    assert_eq!(json["state"], "idle");
    assert_eq!(json["entries"], 0);
    assert_eq!(json["voice_available"], false);
    assert_eq!(json["emotion_enabled"], false);
    assert!(json["session_id"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = build_test_router(ScriptedBackend::new(), EmotionAnnotator::disabled());

    let response = app.oneshot(get("/api/nonexistent")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_foreign_origin_gets_no_cors_grant() {
    let app = build_test_router(ScriptedBackend::new(), EmotionAnnotator::disabled());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/history")
                .header("Origin", "https://elsewhere.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("access-control-allow-origin").is_none());

    let preflight = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/chat")
                .header("Origin", "https://elsewhere.example")
                .header("Access-Control-Request-Method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(preflight.headers().get("access-control-allow-origin").is_none());
    assert!(preflight.headers().get("access-control-allow-methods").is_none());
}
