//! Router tests driving the real application router in-process.
//!
//! The pool connects lazily and every request here is answered before any
//! query runs, so no database is needed.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use locallibrary_server::{
    api,
    config::AppConfig,
    models::user::{Permission, UserClaims},
    services::sessions::MemorySessionStore,
    AppState,
};

const INSTANCE_ID: &str = "6f1c2d6e-8a47-4b8e-9a57-0c1b2a3d4e5f";

fn app() -> (Router, AppConfig) {
    let config = AppConfig::default();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("lazy pool");

    let state = AppState::new(config.clone(), pool, Arc::new(MemorySessionStore::new()));
    (api::router(state), config)
}

fn token(config: &AppConfig, permissions: &[Permission], is_superuser: bool) -> String {
    let now = Utc::now().timestamp();
    UserClaims {
        sub: "librarian".to_string(),
        user_id: 7,
        is_superuser,
        permissions: permissions.iter().map(|p| p.codename().to_string()).collect(),
        exp: now + 3600,
        iat: now,
    }
    .create_token(&config.auth.jwt_secret)
    .expect("token")
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_root_redirects_to_catalog() {
    let (app, _) = app();

    let response = app.oneshot(get("/", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/catalog/");
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = app();

    let response = app.oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_mybooks_requires_login() {
    let (app, _) = app();

    let response = app.oneshot(get("/catalog/mybooks/", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/accounts/login/?next=/catalog/mybooks/");
}

#[tokio::test]
async fn test_garbage_token_is_treated_as_anonymous() {
    let (app, _) = app();

    let response = app
        .oneshot(get("/catalog/mybooks/", Some("not-a-jwt")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/accounts/login/?next=/catalog/mybooks/");
}

#[tokio::test]
async fn test_management_screens_require_login() {
    for uri in [
        "/catalog/author/create/",
        "/catalog/author/3/update/",
        "/catalog/book/create/",
        "/catalog/genre/create/",
    ] {
        let (app, _) = app();
        let response = app.oneshot(get(uri, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND, "{}", uri);
        assert_eq!(location(&response), format!("/accounts/login/?next={}", uri));
    }
}

#[tokio::test]
async fn test_return_without_permission_is_forbidden() {
    let (app, config) = app();
    let token = token(&config, &[], false);

    let response = app
        .oneshot(post_json(
            &format!("/catalog/books/{}/return/", INSTANCE_ID),
            Some(&token),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["error"], "PermissionDenied");
}

#[tokio::test]
async fn test_renew_without_permission_is_forbidden() {
    let (app, config) = app();
    let token = token(&config, &[Permission::AddAuthor], false);

    let response = app
        .clone()
        .oneshot(get(
            &format!("/catalog/book/{}/renew/", INSTANCE_ID),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(post_json(
            &format!("/catalog/book/{}/renew/", INSTANCE_ID),
            Some(&token),
            json!({ "renewal_date": "2030-01-01" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_author_delete_needs_delete_permission() {
    let (app, config) = app();
    let token = token(&config, &[Permission::AddAuthor, Permission::ChangeAuthor], false);

    let response = app
        .oneshot(post_json("/catalog/author/1/delete/", Some(&token), json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_author_create_form_with_permission() {
    let (app, config) = app();
    let token = token(&config, &[Permission::AddAuthor], false);

    let response = app
        .oneshot(get("/catalog/author/create/", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["form"]["first_name"], "");
    assert_eq!(body["errors"], json!({}));
}

#[tokio::test]
async fn test_superuser_passes_permission_checks() {
    let (app, config) = app();
    let token = token(&config, &[], true);

    let response = app
        .oneshot(get("/catalog/genre/create/", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["form"]["name"], "");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (app, _) = app();

    let response = app
        .oneshot(get("/api-docs/openapi.json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["paths"]["/catalog/books/"].is_object());
}

#[tokio::test]
async fn test_out_of_range_ids_are_not_found() {
    for uri in ["/catalog/book/99999999999", "/catalog/author/2147483648/", "/catalog/author/abc/"] {
        let (app, _) = app();
        let response = app.oneshot(get(uri, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(json_body(response).await["error"], "NotFound");
    }
}

#[tokio::test]
async fn test_out_of_range_id_on_management_screen_is_not_found() {
    let (app, config) = app();
    let token = token(&config, &[], true);

    let response = app
        .oneshot(get("/catalog/book/99999999999/update/", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
