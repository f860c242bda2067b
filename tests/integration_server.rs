//! Routing and guard behavior over the assembled application.
//!
//! The platform client points at an unroutable port; every request exercised
//! here resolves before the guard or handler would need a live platform.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response, StatusCode};
use secrecy::SecretString;
use std::sync::Arc;
use tower::ServiceExt;

use atelier::api::handlers::auth::NoopResendLimiter;
use atelier::api::{self, AppConfig, AppState};
use atelier::platform::{Platform, PlatformConfig};
use atelier::studio::StudioStore;

fn app() -> axum::Router {
    let platform_config = PlatformConfig::new(
        "http://127.0.0.1:9".to_string(),
        SecretString::from("anon".to_string()),
        SecretString::from("service".to_string()),
        "http://localhost:8080".to_string(),
    )
    .with_deadline_seconds(1);
    let platform = Arc::new(Platform::new(platform_config).expect("platform client"));

    let state = Arc::new(AppState::new(
        AppConfig::new("http://localhost:8080".to_string()),
        Arc::new(NoopResendLimiter),
        StudioStore::new(),
    ));

    api::router(platform, state).expect("router")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn location<B>(response: &Response<B>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

#[tokio::test]
async fn studio_without_session_redirects_to_login_without_origin() {
    let response = app().oneshot(get("/studio")).await.expect("response");
    assert_eq!(response.status(), StatusCode::FOUND);
    // The canonical landing path carve-out: no redirectedFrom parameter.
    assert_eq!(location(&response), Some("/auth/login"));
}

#[tokio::test]
async fn settings_without_session_preserves_origin() {
    let response = app()
        .oneshot(get("/account/settings"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        location(&response),
        Some("/auth/login?redirectedFrom=%2Faccount%2Fsettings")
    );
}

#[tokio::test]
async fn subscribe_without_session_preserves_origin() {
    let response = app().oneshot(get("/subscribe")).await.expect("response");
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        location(&response),
        Some("/auth/login?redirectedFrom=%2Fsubscribe")
    );
}

#[tokio::test]
async fn public_auth_pages_pass_without_identity_resolution() {
    for uri in ["/auth/login", "/auth/register"] {
        let response = app().oneshot(get(uri)).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK, "uri: {uri}");
    }
}

#[tokio::test]
async fn health_is_never_guarded() {
    let response = app().oneshot(get("/health")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("X-App"));
}

#[tokio::test]
async fn asset_paths_fall_through_instead_of_redirecting() {
    let response = app().oneshot(get("/favicon.ico")).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_routes_self_authenticate_with_401() {
    let response = app()
        .oneshot(get("/api/subscription"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_validation_happens_before_any_platform_call() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"email":"nope","password":"short","confirm_password":"short","first_name":"","last_name":"Doe","phone":""}"#,
        ))
        .expect("request");
    let response = app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    let value: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(value["errors"]["email"], "Please enter a valid email address");
    assert_eq!(value["errors"]["first_name"], "First name is required");
    assert_eq!(
        value["errors"]["password"],
        "Password must be at least 8 characters"
    );
    assert_eq!(value["password_strength"], 0);
}

#[tokio::test]
async fn verify_email_error_params_take_precedence() {
    let response = app()
        .oneshot(get(
            "/auth/verify-email?error_description=Link%20expired&token=t&type=signup",
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    let value: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(value["state"], "error");
    assert_eq!(value["message"], "Link expired");
}

#[tokio::test]
async fn verify_email_without_params_shows_waiting_state() {
    let response = app()
        .oneshot(get("/auth/verify-email"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    let value: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(value["state"], "idle");
}

#[tokio::test]
async fn reset_landing_without_token_is_an_error() {
    let response = app()
        .oneshot(get("/auth/reset-password"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    let value: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(value["state"], "error");
}
