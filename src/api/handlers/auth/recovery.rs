//! Password recovery: request the email, land the link, set the new password.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::error;

use crate::api::state::AppState;
use crate::platform::{OtpType, Platform, PlatformError, UserUpdate};

use super::machine::{classify, LinkDisposition, LinkParams, VerificationState, VerifyEvent};
use super::rate_limit::CooldownDecision;
use super::session::{append_session_cookies, resolve_user, SessionCookies};
use super::types::{
    EmailRequest, ErrorResponse, FieldErrorResponse, FlowResponse, MessageResponse,
    ResetPasswordRequest,
};
use super::validate::{
    normalize_email, password_strength, valid_email, validate_new_password, FieldErrors,
};
use super::verify::{cooldown_message, exchange_message};

const MISSING_TOKEN_MESSAGE: &str =
    "No reset token found. Please request a new password reset link.";

/// Send the recovery email, behind the same cooldown as confirmations.
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Recovery email sent", body = MessageResponse),
        (status = 400, description = "Rejected by the platform", body = ErrorResponse),
        (status = 422, description = "Invalid email", body = FieldErrorResponse),
        (status = 429, description = "Cooldown active; no platform call issued", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    platform: Extension<Arc<Platform>>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<EmailRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        let mut errors = FieldErrors::new();
        errors.insert(
            "email".to_string(),
            "Please enter a valid email address".to_string(),
        );
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(FieldErrorResponse {
                errors,
                password_strength: None,
            }),
        )
            .into_response();
    }

    if let CooldownDecision::Wait { seconds } = state.limiter().check(&email) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse::new(cooldown_message(seconds))),
        )
            .into_response();
    }

    match platform.reset_password_for_email(&email).await {
        Ok(()) => {
            state.limiter().mark_sent(&email);
            (
                StatusCode::OK,
                Json(
                    MessageResponse::new("Password reset email sent!")
                        .with_cooldown(state.config().resend_cooldown_seconds()),
                ),
            )
                .into_response()
        }
        Err(err @ PlatformError::Rejected { .. }) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(err.to_string())),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to send reset email: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "Failed to send reset email. Please try again.",
                )),
            )
                .into_response()
        }
    }
}

/// Land the recovery link: establish a session from its parameters so the
/// new-password form can submit.
///
/// Unlike the verify-email landing, a link with no recognizable parameters is
/// an error here; the page is unusable without a token.
#[utoipa::path(
    get,
    path = "/auth/reset-password",
    responses(
        (status = 200, description = "Flow outcome; `ready` means the form may submit", body = FlowResponse)
    ),
    tag = "auth"
)]
pub async fn reset_password_landing(
    uri: Uri,
    platform: Extension<Arc<Platform>>,
    state: Extension<Arc<AppState>>,
) -> Response {
    let params = LinkParams::from_parts(uri.query(), None);

    match classify(&params) {
        LinkDisposition::PlatformError { message } => {
            let machine = VerificationState::Idle.apply(VerifyEvent::Fail(message));
            landing_flow(&machine)
        }
        LinkDisposition::AdoptSession {
            access_token,
            refresh_token,
            link_type: OtpType::Recovery,
        } => {
            let machine = VerificationState::Idle.apply(VerifyEvent::Begin);
            match platform.adopt_session(&access_token, &refresh_token).await {
                Ok(session) => {
                    let machine = machine.apply(VerifyEvent::Succeed);
                    let mut response_headers = HeaderMap::new();
                    append_session_cookies(&mut response_headers, &session, state.config());
                    ready_flow(&machine, response_headers)
                }
                Err(err) => {
                    error!("Failed to establish recovery session: {err}");
                    let machine = machine.apply(VerifyEvent::Fail(exchange_message(
                        &err,
                        "Failed to establish recovery session",
                    )));
                    landing_flow(&machine)
                }
            }
        }
        LinkDisposition::ExchangeToken {
            token_hash,
            link_type: OtpType::Recovery,
        } => {
            let machine = VerificationState::Idle.apply(VerifyEvent::Begin);
            match platform.verify_otp(&token_hash, OtpType::Recovery).await {
                Ok(outcome) => {
                    let machine = machine.apply(VerifyEvent::Succeed);
                    let mut response_headers = HeaderMap::new();
                    if let Some(session) = outcome.into_session() {
                        append_session_cookies(&mut response_headers, &session, state.config());
                    }
                    ready_flow(&machine, response_headers)
                }
                Err(err) => {
                    error!("Failed to redeem recovery token: {err}");
                    let machine = machine.apply(VerifyEvent::Fail(exchange_message(
                        &err,
                        "Invalid or expired reset link",
                    )));
                    landing_flow(&machine)
                }
            }
        }
        // Signup-typed links, bare codes, or nothing at all: this page
        // requires a recovery token.
        _ => {
            let machine =
                VerificationState::Idle.apply(VerifyEvent::Fail(MISSING_TOKEN_MESSAGE.to_string()));
            landing_flow(&machine)
        }
    }
}

fn ready_flow(machine: &VerificationState, response_headers: HeaderMap) -> Response {
    let label = match machine {
        // The recovery arm reports the absorbing success state as "ready":
        // the password form may now submit.
        VerificationState::Verified => "ready",
        other => other.label(),
    };
    (
        StatusCode::OK,
        response_headers,
        Json(FlowResponse::new(label, "You can now reset your password")),
    )
        .into_response()
}

fn landing_flow(machine: &VerificationState) -> Response {
    let message = match machine {
        VerificationState::Error(message) => message.clone(),
        _ => MISSING_TOKEN_MESSAGE.to_string(),
    };
    (
        StatusCode::OK,
        Json(FlowResponse::new(machine.label(), message)),
    )
        .into_response()
}

/// Set the new password using the recovery session established at landing.
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = FlowResponse),
        (status = 400, description = "Rejected by the platform", body = ErrorResponse),
        (status = 401, description = "No recovery session", body = ErrorResponse),
        (status = 422, description = "Invalid fields", body = FieldErrorResponse)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    headers: HeaderMap,
    platform: Extension<Arc<Platform>>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let mut errors = FieldErrors::new();
    validate_new_password(
        &mut errors,
        &request.password,
        Some(request.confirm_password.as_str()),
    );
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

    let cookies = SessionCookies::from_headers(&headers);
    let Some(authed) = resolve_user(&platform, &cookies).await else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(MISSING_TOKEN_MESSAGE)),
        )
            .into_response();
    };

    let update = UserUpdate {
        password: Some(request.password.clone()),
        data: None,
    };
    match platform.update_user(&authed.access_token, &update).await {
        Ok(_) => (
            StatusCode::OK,
            Json(
                FlowResponse::new("success", "Password reset successful!")
                    .redirecting("/auth/login", 2000),
            ),
        )
            .into_response(),
        Err(err @ PlatformError::Rejected { .. }) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(err.to_string())),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to update password: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "Failed to reset password. Please try again.",
                )),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{platform, state};
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn forgot_password_invalid_email_fails_locally() {
        let response = forgot_password(
            Extension(platform()),
            Extension(state()),
            Some(Json(EmailRequest {
                email: "nope".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn landing_without_params_reports_missing_token() {
        let response = reset_password_landing(
            Uri::from_static("/auth/reset-password"),
            Extension(platform()),
            Extension(state()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["state"], "error");
        assert_eq!(value["message"], MISSING_TOKEN_MESSAGE);
    }

    #[tokio::test]
    async fn landing_with_error_params_reports_them_first() {
        let response = reset_password_landing(
            Uri::from_static(
                "/auth/reset-password?error_description=Reset%20link%20expired&type=recovery&token=t",
            ),
            Extension(platform()),
            Extension(state()),
        )
        .await;
        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["state"], "error");
        assert_eq!(value["message"], "Reset link expired");
    }

    #[tokio::test]
    async fn reset_password_mismatch_fails_locally() {
        let response = reset_password(
            HeaderMap::new(),
            Extension(platform()),
            Extension(state()),
            Some(Json(ResetPasswordRequest {
                password: "long-enough".to_string(),
                confirm_password: "different".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn reset_password_without_session_is_unauthorized() {
        let response = reset_password(
            HeaderMap::new(),
            Extension(platform()),
            Extension(state()),
            Some(Json(ResetPasswordRequest {
                password: "long-enough".to_string(),
                confirm_password: "long-enough".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
