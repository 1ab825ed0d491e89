//! HTTP Integration Tests
//!
//! Drive the registration endpoints through the router, resolving tenants
//! from the `Host` header.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tenant_oauth::config::Config;
use tenant_oauth::http::{AppState, build_router};
use tenant_oauth::storage::MemoryDocumentStore;
use tenant_oauth::tenant::{SigningKey, Tenant, TenantRegistry};
use tower::ServiceExt;

const ALICE: &str = "alice.example.net";
const BOB: &str = "bob.example.net";

fn app() -> Router {
    let config = Config {
        version: "test".to_string(),
        http_port: "8080".to_string().try_into().unwrap(),
        tenants: format!("{};{}", ALICE, BOB).try_into().unwrap(),
        enable_client_registration: "true".to_string().try_into().unwrap(),
        client_list_limit: None::<String>.try_into().unwrap(),
    };

    let mut tenants = TenantRegistry::new();
    for domain in [ALICE, BOB] {
        tenants.insert(Tenant::new(
            domain,
            SigningKey::generate(),
            Arc::new(MemoryDocumentStore::new()),
        ));
    }

    build_router(AppState::new(config, tenants))
}

fn request(
    method: &str,
    host: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, host);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn registration() -> Value {
    json!({
        "redirect_uris": ["https://app.example/cb"],
        "client_name": "Foo",
        "software_id": "sw1",
    })
}

async fn register(app: &Router, host: &str) -> (String, String, String) {
    let (status, body) = send(
        app,
        request("POST", host, "/auth/register", None, Some(registration())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (
        body["client_id"].as_str().unwrap().to_string(),
        body["client_secret"].as_str().unwrap().to_string(),
        body["registration_access_token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_register_endpoint() {
    let app = app();

    let (status, body) = send(
        &app,
        request("POST", ALICE, "/auth/register", None, Some(registration())),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(!body["client_id"].as_str().unwrap().is_empty());
    assert!(!body["client_secret"].as_str().unwrap().is_empty());
    assert_eq!(body["client_secret_expires_at"], 0);
    assert!(body["registration_access_token"].is_string());
    assert_eq!(body["grant_types"], json!(["authorization_code", "refresh_token"]));
    assert_eq!(body["response_types"], json!(["code"]));
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = app();

    let (status, body) = send(
        &app,
        request(
            "POST",
            ALICE,
            "/auth/register",
            None,
            Some(json!({"client_name": "Foo", "software_id": "sw1"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "invalid_redirect_uri", "error_description": "redirect_uris is mandatory"})
    );

    let (status, body) = send(
        &app,
        request(
            "POST",
            ALICE,
            "/auth/register",
            None,
            Some(json!({
                "redirect_uris": ["https://app.example/cb"],
                "client_name": "Foo",
                "software_id": "sw1",
                "notification_platform": "blackberry",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "invalid_client_metadata"}));
}

#[tokio::test]
async fn test_unknown_instance() {
    let app = app();
    let (status, body) = send(
        &app,
        request("POST", "carol.example.net", "/auth/register", None, Some(registration())),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "unknown_instance"}));
}

#[tokio::test]
async fn test_client_management_lifecycle() {
    let app = app();
    let (client_id, secret, token) = register(&app, ALICE).await;
    let uri = format!("/auth/register/{}", client_id);

    // Read
    let (status, body) = send(&app, request("GET", ALICE, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["client_id"], client_id.as_str());
    assert_eq!(body["client_name"], "Foo");
    assert!(body.get("registration_access_token").is_none());

    // Update with rotation
    let mut update = registration();
    update["client_id"] = json!(client_id);
    update["client_secret"] = json!(secret);
    update["client_name"] = json!("Renamed");
    update["software_version"] = json!("2.0");
    let (status, body) =
        send(&app, request("PUT", ALICE, &uri, Some(&token), Some(update.clone()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["client_name"], "Foo");
    assert_eq!(body["software_version"], "2.0");
    assert_ne!(body["client_secret"], json!(secret));

    // The previous secret is no longer accepted
    let (status, body) =
        send(&app, request("PUT", ALICE, &uri, Some(&token), Some(update))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_client_secret");

    // Delete
    let (status, body) = send(&app, request("DELETE", ALICE, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&app, request("GET", ALICE, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "invalid_client_id"}));
}

#[tokio::test]
async fn test_update_requires_matching_client_id() {
    let app = app();
    let (client_id, _, token) = register(&app, ALICE).await;
    let uri = format!("/auth/register/{}", client_id);

    let (status, body) =
        send(&app, request("PUT", ALICE, &uri, Some(&token), Some(registration()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "invalid_client_id", "error_description": "client_id is mandatory"})
    );
}

#[tokio::test]
async fn test_registration_token_is_required() {
    let app = app();
    let (client_id, _, token) = register(&app, ALICE).await;
    let (other_id, _, other_token) = register(&app, ALICE).await;
    let uri = format!("/auth/register/{}", client_id);

    for presented in [None, Some("garbage"), Some(other_token.as_str())] {
        let (status, body) = send(&app, request("GET", ALICE, &uri, presented, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "invalid_token"}));
    }

    let (status, _) = send(&app, request("DELETE", ALICE, &uri, Some(&other_token), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Both clients are still there
    let (status, _) = send(&app, request("GET", ALICE, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let other_uri = format!("/auth/register/{}", other_id);
    let (status, _) = send(&app, request("GET", ALICE, &other_uri, Some(&other_token), None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_tenants_are_isolated() {
    let app = app();
    let (client_id, _, token) = register(&app, ALICE).await;
    let uri = format!("/auth/register/{}", client_id);

    // Bob does not know the client
    let (status, body) = send(&app, request("GET", BOB, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "invalid_client_id");

    // Same name, different tenant: no suffix
    let (status, body) = send(
        &app,
        request("POST", "BOB.example.net:8080", "/auth/register", None, Some(registration())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["client_name"], "Foo");
}
