//! API integration tests.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

mod common;
use common::test_app;

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(Method::GET)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn put_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(Method::PUT)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "lattis");
    assert!(json["version"].is_string());
    assert_eq!(json["active_connections"], 0);
}

#[tokio::test]
async fn test_agent_listing_covers_all_kinds() {
    let app = test_app();

    let response = app.oneshot(get("/agents")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let agents = json["agents"].as_array().unwrap();
    assert_eq!(agents.len(), 5);
    assert_eq!(agents[0]["agent"], "career_advisor");
    assert!(agents[0]["capabilities"].as_array().unwrap().len() > 1);
}

#[tokio::test]
async fn test_chat_turn_creates_conversation() {
    let app = test_app();

    let response = app
        .oneshot(post_json(
            "/chat",
            json!({
                "user_id": "u1",
                "agent": "career_advisor",
                "message": "hello, I'm a software engineer"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["conversation_id"].is_string());
    assert!(json["message_id"].is_string());
    assert_eq!(json["agent_response"]["agent"], "career_advisor");
    assert_eq!(json["agent_response"]["message_id"], json["message_id"]);
    let confidence = json["agent_response"]["confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence));
}

#[tokio::test]
async fn test_chat_turn_reuses_explicit_conversation() {
    let app = test_app();

    let first = app
        .clone()
        .oneshot(post_json(
            "/chat",
            json!({
                "user_id": "u1",
                "agent": "career_advisor",
                "message": "hello",
                "conversation_id": "c1"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;
    assert_eq!(first["conversation_id"], "c1");

    let second = app
        .clone()
        .oneshot(post_json(
            "/chat",
            json!({
                "user_id": "u1",
                "agent": "skills_analyzer",
                "message": "I know rust and sql",
                "conversation_id": "c1"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);

    let conversation = app.oneshot(get("/conversations/c1")).await.unwrap();
    assert_eq!(conversation.status(), StatusCode::OK);
    let conversation = body_json(conversation).await;
    assert_eq!(conversation["messages"].as_array().unwrap().len(), 2);
    assert_eq!(conversation["responses"].as_array().unwrap().len(), 2);
    let engaged = conversation["engaged_agents"].as_array().unwrap();
    assert_eq!(engaged.len(), 2);
    assert_eq!(conversation["agent_message_counts"]["career_advisor"], 1);
    assert_eq!(conversation["agent_message_counts"]["skills_analyzer"], 1);
}

#[tokio::test]
async fn test_chat_rejects_unknown_agent() {
    let app = test_app();

    let response = app
        .oneshot(post_json(
            "/chat",
            json!({
                "user_id": "u1",
                "agent": "blockchain_oracle",
                "message": "hello"
            }),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_chat_rejects_empty_message() {
    let app = test_app();

    let response = app
        .oneshot(post_json(
            "/chat",
            json!({
                "user_id": "u1",
                "agent": "career_advisor",
                "message": "   "
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_unknown_conversation_is_404() {
    let app = test_app();

    let response = app.oneshot(get("/conversations/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_connection_stats_reflect_chat_activity() {
    let app = test_app();

    app.clone()
        .oneshot(post_json(
            "/chat",
            json!({
                "user_id": "u1",
                "agent": "career_advisor",
                "message": "hello"
            }),
        ))
        .await
        .unwrap();

    let response = app.oneshot(get("/connections/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["active_connections"], 0);
    assert_eq!(json["active_conversations"], 1);
}

#[tokio::test]
async fn test_profile_upsert_then_fetch() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(put_json(
            "/profiles/u1",
            json!({
                "current_role": "software engineer",
                "skills": ["Rust", "SQL"]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["current_role"], "software engineer");

    let response = app.oneshot(get("/profiles/u1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["skills"], json!(["Rust", "SQL"]));
}

#[tokio::test]
async fn test_profile_for_unknown_user_is_empty() {
    let app = test_app();

    let response = app.oneshot(get("/profiles/nobody")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json, json!({}));
}

#[tokio::test]
async fn test_empty_profile_update_is_rejected() {
    let app = test_app();

    let response = app
        .oneshot(put_json("/profiles/u1", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stored_profile_enriches_chat_analysis() {
    let app = test_app();

    app.clone()
        .oneshot(put_json(
            "/profiles/u1",
            json!({ "current_role": "software engineer" }),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(post_json(
            "/chat",
            json!({
                "user_id": "u1",
                "agent": "career_advisor",
                "message": "what should my next step be?"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let analysis = &json["agent_response"]["analysis"];
    assert_eq!(analysis["detected_role"], "software engineer");
    let paths = analysis["career_paths"].as_array().unwrap();
    assert!(!paths.is_empty());
}

#[tokio::test]
async fn test_connection_info_for_unknown_user() {
    let app = test_app();

    let response = app.oneshot(get("/connections/ghost")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["connected"], false);
    assert_eq!(json["queued_messages"], 0);
}
