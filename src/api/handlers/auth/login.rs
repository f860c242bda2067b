//! Password sign-in.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::error;

use crate::api::state::AppState;
use crate::platform::{Platform, PlatformError};

use super::session::append_session_cookies;
use super::types::{ErrorResponse, FieldErrorResponse, LoginRequest, ProfileResponse};
use super::validate::{normalize_email, validate_login};

/// Exchange credentials for a cookie session.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in; session cookies set", body = ProfileResponse),
        (status = 401, description = "Rejected credentials or unverified email", body = ErrorResponse),
        (status = 422, description = "Missing fields", body = FieldErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    platform: Extension<Arc<Platform>>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let errors = validate_login(&request.email, &request.password);
    if !errors.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(FieldErrorResponse {
                errors,
                password_strength: None,
            }),
        )
            .into_response();
    }

    let email = normalize_email(&request.email);
    match platform.sign_in(&email, &request.password).await {
        Ok(session) => {
            let Some(user) = session.user.clone() else {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("Login failed. No session returned.")),
                )
                    .into_response();
            };
            let mut response_headers = HeaderMap::new();
            append_session_cookies(&mut response_headers, &session, state.config());
            (
                StatusCode::OK,
                response_headers,
                Json(ProfileResponse::from(&user)),
            )
                .into_response()
        }
        // Unverified accounts change the affordance, not just the message.
        Err(err) if err.is_email_not_confirmed() => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Email not verified").needs_verification()),
        )
            .into_response(),
        Err(err @ PlatformError::Rejected { .. }) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(err.to_string())),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to sign in: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to login.")),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{platform, state};
    use super::*;

    #[tokio::test]
    async fn login_missing_payload() {
        let response = login(Extension(platform()), Extension(state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_empty_fields_fail_locally() {
        let response = login(
            Extension(platform()),
            Extension(state()),
            Some(Json(LoginRequest {
                email: String::new(),
                password: String::new(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
