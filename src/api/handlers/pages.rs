//! Page-shell handlers. The real markup lives in the browser client; these
//! return the data each page needs. Guarded pages receive the caller's
//! identity from the route guard.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use crate::api::guard::CurrentUser;
use crate::api::state::AppState;
use crate::platform::Platform;

use super::auth::types::ProfileResponse;

/// Product banner plus primary navigation.
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "tagline": "Design together, ship faster.",
        "nav": [
            { "title": "Features", "href": "/features" },
            { "title": "Pricing", "href": "/pricing" },
            { "title": "Contact Us", "href": "/contact" },
        ],
    }))
}

pub async fn login_page() -> impl IntoResponse {
    Json(json!({ "page": "login", "title": "Sign in" }))
}

pub async fn register_page() -> impl IntoResponse {
    Json(json!({ "page": "register", "title": "Create your account" }))
}

pub async fn forgot_password_page() -> impl IntoResponse {
    Json(json!({ "page": "forgot-password", "title": "Reset your password" }))
}

/// Studio editor shell for the signed-in (and entitled) caller.
pub async fn studio_page(
    Extension(current): Extension<CurrentUser>,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let shell = state.studio().snapshot(current.user.id);
    Json(json!({
        "user": ProfileResponse::from(&current.user),
        "shell": shell,
    }))
}

/// Profile plus subscription projection for the settings page.
pub async fn account_settings(
    Extension(current): Extension<CurrentUser>,
    platform: Extension<Arc<Platform>>,
) -> impl IntoResponse {
    let subscription = match platform
        .subscription_for_user(&current.access_token, current.user.id)
        .await
    {
        Ok(subscription) => subscription,
        Err(err) => {
            // The page still renders; the subscription section shows empty.
            error!("Failed to fetch subscription for settings: {err}");
            None
        }
    };
    Json(json!({
        "profile": ProfileResponse::from(&current.user),
        "subscription": subscription,
    }))
}

/// Plans listing plus the caller's current status.
pub async fn subscribe_page(
    Extension(current): Extension<CurrentUser>,
    platform: Extension<Arc<Platform>>,
) -> impl IntoResponse {
    let plans = match platform.list_plans().await {
        Ok(plans) => plans,
        Err(err) => {
            error!("Failed to fetch plans: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to load plans." })),
            )
                .into_response();
        }
    };
    let subscription = platform
        .subscription_for_user(&current.access_token, current.user.id)
        .await
        .unwrap_or_default();
    Json(json!({
        "plans": plans,
        "subscription": subscription,
    }))
    .into_response()
}
