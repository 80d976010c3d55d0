//! Router-level tests against an in-memory directory.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{CacheConfig, ResilienceConfig};
use directory_service_lib::cache::MemoryCache;
use directory_service_lib::storage::MemoryStore;
use directory_service_lib::Directory;
use gateway_lib::config::GatewayConfig;
use gateway_lib::routes::create_router;
use gateway_lib::state::AppState;

fn app() -> Router {
    let directory = Directory::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryCache::new()),
        ResilienceConfig::default(),
        CacheConfig::default().ttl(),
    );
    create_router(AppState::new(Arc::new(directory), GatewayConfig::default()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn registration(email: &str, username: &str) -> Value {
    json!({
        "email": email,
        "password": "SecurePass123!",
        "username": username,
        "date_of_birth": "1990-01-01"
    })
}

async fn register(app: &Router, email: &str, username: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/register",
        Some(registration(email, username)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

#[tokio::test]
async fn test_register_returns_account_without_credential() {
    let app = app();
    let body = register(&app, "Neo@Strafe.chat", "neo").await;

    assert_eq!(body["email"], "neo@strafe.chat");
    assert_eq!(body["username"], "neo");
    assert_eq!(body["discriminator"], "0001");
    assert_eq!(body["locale"], "en-US");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let app = app();
    register(&app, "neo@strafe.chat", "neo").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        Some(registration("NEO@strafe.chat", "trinity")),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_EMAIL");
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let app = app();
    let mut payload = registration("neo@strafe.chat", "neo");
    payload["password"] = json!("short");

    let (status, body) = send(&app, Method::POST, "/auth/register", Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_register_rejects_malformed_body() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        Some(json!({ "email": "neo@strafe.chat" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_lookups_resolve_same_account() {
    let app = app();
    let created = register(&app, "neo@strafe.chat", "neo").await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, by_id) = send(&app, Method::GET, &format!("/users/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, by_email) = send(&app, Method::GET, "/users/by-email/NEO@strafe.chat", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, by_handle) = send(&app, Method::GET, "/users/by-handle/neo/0001", None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(by_id["id"], created["id"]);
    assert_eq!(by_email["id"], created["id"]);
    assert_eq!(by_handle["id"], created["id"]);
}

#[tokio::test]
async fn test_unknown_lookups_are_not_found() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::GET,
        "/users/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send(&app, Method::GET, "/users/by-handle/ghost/0001", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_discriminator_lookup_is_rejected() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/users/by-handle/neo/12", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_profile_update_is_visible() {
    let app = app();
    let created = register(&app, "neo@strafe.chat", "neo").await;
    let uri = format!("/users/{}", created["id"].as_str().unwrap());

    // Warm the cache before the write
    send(&app, Method::GET, &uri, None).await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({ "display_name": "The One", "bio": "Whoa." })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["display_name"], "The One");

    let (_, fetched) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(fetched["display_name"], "The One");
    assert_eq!(fetched["bio"], "Whoa.");
}

#[tokio::test]
async fn test_empty_profile_update_is_rejected() {
    let app = app();
    let created = register(&app, "neo@strafe.chat", "neo").await;
    let uri = format!("/users/{}", created["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::PATCH, &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_identifier_change_moves_lookups() {
    let app = app();
    let created = register(&app, "neo@strafe.chat", "neo").await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/users/{}/identifiers", id),
        Some(json!({ "email": "thomas@strafe.chat", "username": "anderson" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "thomas@strafe.chat");
    assert_eq!(body["username"], "anderson");

    let (status, _) = send(&app, Method::GET, "/users/by-email/neo@strafe.chat", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, moved) = send(
        &app,
        Method::GET,
        &format!("/users/by-handle/anderson/{}", body["discriminator"].as_str().unwrap()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["id"], created["id"]);
}

#[tokio::test]
async fn test_identifier_change_onto_taken_email_conflicts() {
    let app = app();
    register(&app, "neo@strafe.chat", "neo").await;
    let trinity = register(&app, "trinity@strafe.chat", "trinity").await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/users/{}/identifiers", trinity["id"].as_str().unwrap()),
        Some(json!({ "email": "neo@strafe.chat" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_EMAIL");
}

#[tokio::test]
async fn test_delete_then_not_found() {
    let app = app();
    let created = register(&app, "neo@strafe.chat", "neo").await;
    let uri = format!("/users/{}", created["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Identifiers are free again
    register(&app, "neo@strafe.chat", "neo").await;
}

#[tokio::test]
async fn test_health_reports_backends() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["storage"], "healthy");
    assert_eq!(body["services"]["cache"], "healthy");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/auth/register"].is_object());
}
