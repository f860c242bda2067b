//! Profile reads/updates and the account danger zone.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::api::state::AppState;
use crate::platform::{Platform, PlatformError, UserUpdate};

use super::auth::session::{
    append_clear_cookies, append_session_cookies, resolve_user, SessionCookies,
};
use super::auth::types::{ErrorResponse, ProfileResponse};

#[derive(ToSchema, Deserialize, Debug)]
pub struct ProfileUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Read the caller's profile projection.
#[utoipa::path(
    get,
    path = "/api/account/profile",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "No session", body = ErrorResponse)
    ),
    tag = "account"
)]
pub async fn profile(
    headers: HeaderMap,
    platform: Extension<Arc<Platform>>,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let cookies = SessionCookies::from_headers(&headers);
    let Some(authed) = resolve_user(&platform, &cookies).await else {
        return unauthorized();
    };

    let mut response_headers = HeaderMap::new();
    if let Some(session) = &authed.refreshed {
        append_session_cookies(&mut response_headers, session, state.config());
    }
    (
        StatusCode::OK,
        response_headers,
        Json(ProfileResponse::from(&authed.user)),
    )
        .into_response()
}

/// Update profile metadata on the platform's user record.
#[utoipa::path(
    patch,
    path = "/api/account/profile",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Nothing to update or rejected", body = ErrorResponse),
        (status = 401, description = "No session", body = ErrorResponse)
    ),
    tag = "account"
)]
pub async fn update_profile(
    headers: HeaderMap,
    platform: Extension<Arc<Platform>>,
    payload: Option<Json<ProfileUpdateRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let mut data = serde_json::Map::new();
    if let Some(first_name) = &request.first_name {
        data.insert("first_name".to_string(), json!(first_name.trim()));
    }
    if let Some(last_name) = &request.last_name {
        data.insert("last_name".to_string(), json!(last_name.trim()));
    }
    if let Some(phone) = &request.phone {
        data.insert("phone_number".to_string(), json!(phone.trim()));
    }
    if data.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("No fields to update")),
        )
            .into_response();
    }

    let cookies = SessionCookies::from_headers(&headers);
    let Some(authed) = resolve_user(&platform, &cookies).await else {
        return unauthorized();
    };

    let update = UserUpdate {
        password: None,
        data: Some(serde_json::Value::Object(data)),
    };
    match platform.update_user(&authed.access_token, &update).await {
        Ok(user) => (StatusCode::OK, Json(ProfileResponse::from(&user))).into_response(),
        Err(err @ PlatformError::Rejected { .. }) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(err.to_string())),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to update profile: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to update profile.")),
            )
                .into_response()
        }
    }
}

/// Permanently delete the caller's account and clear the session.
#[utoipa::path(
    delete,
    path = "/api/account",
    responses(
        (status = 204, description = "Account deleted; cookies cleared"),
        (status = 401, description = "No session", body = ErrorResponse),
        (status = 500, description = "Deletion failed", body = ErrorResponse)
    ),
    tag = "account"
)]
pub async fn delete_account(
    headers: HeaderMap,
    platform: Extension<Arc<Platform>>,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let cookies = SessionCookies::from_headers(&headers);
    let Some(authed) = resolve_user(&platform, &cookies).await else {
        return unauthorized();
    };

    match platform.delete_user(authed.user.id).await {
        Ok(()) => {
            let mut response_headers = HeaderMap::new();
            append_clear_cookies(&mut response_headers, state.config());
            (StatusCode::NO_CONTENT, response_headers).into_response()
        }
        Err(err) => {
            error!("Failed to delete account: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to delete account")),
            )
                .into_response()
        }
    }
}

fn unauthorized() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("Unauthorized")),
    )
        .into_response()
}
