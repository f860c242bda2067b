//! Email verification: the link landing and the manual resend.

use axum::{
    extract::Extension,
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::error;

use crate::api::state::AppState;
use crate::platform::{OtpType, Platform, PlatformError};

use super::machine::{
    classify, LinkDisposition, LinkParams, VerificationState, VerifyEvent, GENERIC_EXCHANGE_ERROR,
};
use super::rate_limit::CooldownDecision;
use super::session::{append_session_cookies, SessionCookies};
use super::types::{EmailRequest, ErrorResponse, FieldErrorResponse, FlowResponse, MessageResponse};
use super::validate::{normalize_email, valid_email};

pub(crate) fn cooldown_message(seconds: u64) -> String {
    format!("Please wait {seconds}s before resending another confirmation email.")
}

/// Platform rejections pass through verbatim; transport-level failures get
/// the generic fallback.
pub(crate) fn exchange_message(err: &PlatformError, fallback: &str) -> String {
    match err {
        PlatformError::Rejected { message, .. } => message.clone(),
        _ => fallback.to_string(),
    }
}

/// Land the emailed verification link and drive it to a terminal state.
///
/// Recovery-typed links are not handled here; they bounce to the
/// reset-password landing with their parameters intact.
#[utoipa::path(
    get,
    path = "/auth/verify-email",
    responses(
        (status = 200, description = "Flow outcome", body = FlowResponse),
        (status = 307, description = "Recovery link, forwarded to the reset landing")
    ),
    tag = "auth"
)]
pub async fn verify_email(
    uri: Uri,
    headers: HeaderMap,
    platform: Extension<Arc<Platform>>,
    state: Extension<Arc<AppState>>,
) -> Response {
    let params = LinkParams::from_parts(uri.query(), None);
    let cooldown = state.config().resend_cooldown_seconds();

    match classify(&params) {
        LinkDisposition::PlatformError { message } => {
            let machine = VerificationState::Idle.apply(VerifyEvent::Fail(message));
            error_flow(&machine, cooldown)
        }
        LinkDisposition::AdoptSession {
            access_token,
            refresh_token,
            link_type,
        } => {
            if link_type == OtpType::Recovery {
                return recovery_redirect(&uri);
            }
            let machine = VerificationState::Idle.apply(VerifyEvent::Begin);
            match platform.adopt_session(&access_token, &refresh_token).await {
                Ok(session) => {
                    let machine = machine.apply(VerifyEvent::Succeed);
                    let mut response_headers = HeaderMap::new();
                    append_session_cookies(&mut response_headers, &session, state.config());
                    verified_flow(&machine, response_headers, "/studio")
                }
                Err(err) => {
                    error!("Failed to adopt session from verification link: {err}");
                    let machine = machine.apply(VerifyEvent::Fail(exchange_message(
                        &err,
                        "Failed to establish session",
                    )));
                    error_flow(&machine, cooldown)
                }
            }
        }
        LinkDisposition::ExchangeToken {
            token_hash,
            link_type,
        } => {
            if link_type == OtpType::Recovery {
                return recovery_redirect(&uri);
            }
            let machine = VerificationState::Idle.apply(VerifyEvent::Begin);
            match platform.verify_otp(&token_hash, OtpType::Signup).await {
                Ok(outcome) => {
                    let machine = machine.apply(VerifyEvent::Succeed);
                    let mut response_headers = HeaderMap::new();
                    if let Some(session) = outcome.into_session() {
                        append_session_cookies(&mut response_headers, &session, state.config());
                    }
                    verified_flow(&machine, response_headers, "/studio")
                }
                Err(err) => {
                    error!("Failed to redeem verification token: {err}");
                    let machine = machine.apply(VerifyEvent::Fail(exchange_message(
                        &err,
                        GENERIC_EXCHANGE_ERROR,
                    )));
                    error_flow(&machine, cooldown)
                }
            }
        }
        LinkDisposition::ExchangeCode { code } => {
            // The code shape starts from a clean slate: drop any current
            // session before redeeming.
            let cookies = SessionCookies::from_headers(&headers);
            if let Some(access_token) = &cookies.access {
                if let Err(err) = platform.sign_out(access_token).await {
                    error!("Failed to sign out before code verification: {err}");
                }
            }
            let machine = VerificationState::Idle.apply(VerifyEvent::Begin);
            match platform.verify_otp(&code, OtpType::Signup).await {
                Ok(_) => {
                    let machine = machine.apply(VerifyEvent::Succeed);
                    verified_flow(&machine, HeaderMap::new(), "/auth/login")
                }
                Err(err) => {
                    error!("Failed to redeem verification code: {err}");
                    let machine = machine.apply(VerifyEvent::Fail(exchange_message(
                        &err,
                        GENERIC_EXCHANGE_ERROR,
                    )));
                    error_flow(&machine, cooldown)
                }
            }
        }
        // No terminal state is forced; the client shows the waiting screen
        // with the resend affordance.
        LinkDisposition::AwaitEmail => {
            let machine = VerificationState::Idle;
            (
                StatusCode::OK,
                Json(
                    FlowResponse::new(
                        machine.label(),
                        "We've sent a verification email to your email address",
                    )
                    .with_cooldown(cooldown),
                ),
            )
                .into_response()
        }
    }
}

fn verified_flow(
    machine: &VerificationState,
    response_headers: HeaderMap,
    redirect_to: &str,
) -> Response {
    (
        StatusCode::OK,
        response_headers,
        Json(
            FlowResponse::new(machine.label(), "Email verified successfully!")
                .redirecting(redirect_to, 2000),
        ),
    )
        .into_response()
}

fn error_flow(machine: &VerificationState, cooldown: u64) -> Response {
    let message = match machine {
        VerificationState::Error(message) => message.clone(),
        _ => GENERIC_EXCHANGE_ERROR.to_string(),
    };
    (
        StatusCode::OK,
        Json(FlowResponse::new(machine.label(), message).with_cooldown(cooldown)),
    )
        .into_response()
}

fn recovery_redirect(uri: &Uri) -> Response {
    let location = match uri.query() {
        Some(query) => format!("/auth/reset-password?{query}"),
        None => "/auth/reset-password".to_string(),
    };
    match HeaderValue::from_str(&location) {
        Ok(value) => {
            let mut headers = HeaderMap::new();
            headers.insert(LOCATION, value);
            (StatusCode::TEMPORARY_REDIRECT, headers).into_response()
        }
        Err(_) => StatusCode::TEMPORARY_REDIRECT.into_response(),
    }
}

/// Re-send the confirmation email, behind the local cooldown.
#[utoipa::path(
    post,
    path = "/api/auth/resend-confirmation",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Email sent", body = MessageResponse),
        (status = 400, description = "Rejected by the platform", body = ErrorResponse),
        (status = 422, description = "Invalid email", body = FieldErrorResponse),
        (status = 429, description = "Cooldown active; no platform call issued", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn resend_confirmation(
    platform: Extension<Arc<Platform>>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<EmailRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        let mut errors = super::validate::FieldErrors::new();
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

    // The cooldown is checked before any network work.
    if let CooldownDecision::Wait { seconds } = state.limiter().check(&email) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse::new(cooldown_message(seconds))),
        )
            .into_response();
    }

    match platform.resend_confirmation(&email).await {
        Ok(()) => {
            // Only a successful send starts the window.
            state.limiter().mark_sent(&email);
            (
                StatusCode::OK,
                Json(
                    MessageResponse::new("Confirmation email resent! Check your inbox.")
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
            error!("Failed to resend confirmation: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to resend confirmation email.")),
            )
                .into_response()
        }
    }
}
