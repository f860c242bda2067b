//! Account creation.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::error;

use crate::platform::{Platform, PlatformError, SignUpParams};

use super::types::{ErrorResponse, FieldErrorResponse, MessageResponse, SignupRequest};
use super::validate::{normalize_email, password_strength, validate_signup};

/// Create an account; the user must follow the emailed link before signing in.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created, confirmation pending", body = MessageResponse),
        (status = 400, description = "Rejected by the platform", body = ErrorResponse),
        (status = 422, description = "Invalid fields", body = FieldErrorResponse)
    ),
    tag = "auth"
)]
pub async fn signup(
    platform: Extension<Arc<Platform>>,
    payload: Option<Json<SignupRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    // Field validation happens locally; invalid requests never reach the platform.
    let errors = validate_signup(&request);
    if !errors.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(FieldErrorResponse {
                errors,
                password_strength: Some(password_strength(&request.password)),
            }),
        )
            .into_response();
    }

    let params = SignUpParams {
        email: normalize_email(&request.email),
        password: request.password.clone(),
        phone: Some(request.phone.trim().to_string()),
        first_name: request.first_name.trim().to_string(),
        last_name: request.last_name.trim().to_string(),
    };

    match platform.sign_up(&params).await {
        Ok(_) => (
            StatusCode::CREATED,
            Json(MessageResponse::new(
                "Account created! Please check your email to verify your account.",
            )),
        )
            .into_response(),
        Err(err @ PlatformError::Rejected { .. }) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(err.to_string())),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to sign up: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "An unexpected error occurred during signup.",
                )),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::platform;
    use super::*;

    #[tokio::test]
    async fn signup_missing_payload() {
        let response = signup(Extension(platform()), None).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signup_short_password_fails_locally() {
        let response = signup(
            Extension(platform()),
            Some(Json(SignupRequest {
                email: "alice@example.com".to_string(),
                password: "short".to_string(),
                confirm_password: "short".to_string(),
                first_name: "Alice".to_string(),
                last_name: "Doe".to_string(),
                phone: "+15550100".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
