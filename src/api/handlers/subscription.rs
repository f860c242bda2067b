//! Subscription CRUD and plan listing over the platform's tables.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Months, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::platform::{
    NewSubscription, Plan, Platform, Subscription, SubscriptionPatch, SubscriptionStatus,
};

use super::auth::session::{resolve_user, SessionCookies};
use super::auth::types::ErrorResponse;

#[derive(ToSchema, Serialize, Debug)]
pub struct SubscriptionEnvelope {
    pub subscription: Option<Subscription>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct PlansResponse {
    pub plans: Vec<Plan>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct UpsertSubscriptionRequest {
    pub plan_id: Option<String>,
    pub status: Option<SubscriptionStatus>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct PatchSubscriptionRequest {
    pub cancel_at_period_end: Option<bool>,
    pub status: Option<SubscriptionStatus>,
}

/// Read the caller's subscription row; absent rows are not an error.
#[utoipa::path(
    get,
    path = "/api/subscription",
    responses(
        (status = 200, description = "Subscription or null", body = SubscriptionEnvelope),
        (status = 401, description = "No session", body = ErrorResponse)
    ),
    tag = "subscription"
)]
pub async fn get_subscription(
    headers: HeaderMap,
    platform: Extension<Arc<Platform>>,
) -> impl IntoResponse {
    let cookies = SessionCookies::from_headers(&headers);
    let Some(authed) = resolve_user(&platform, &cookies).await else {
        return unauthorized();
    };

    match platform
        .subscription_for_user(&authed.access_token, authed.user.id)
        .await
    {
        Ok(subscription) => {
            (StatusCode::OK, Json(SubscriptionEnvelope { subscription })).into_response()
        }
        Err(err) => {
            error!("Failed to fetch subscription: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(err.to_string())),
            )
                .into_response()
        }
    }
}

/// Create or replace the caller's subscription, keyed on `user_id`.
///
/// The period always starts now and runs one month; the cancel flag resets.
#[utoipa::path(
    post,
    path = "/api/subscription",
    request_body = UpsertSubscriptionRequest,
    responses(
        (status = 200, description = "Upserted subscription", body = SubscriptionEnvelope),
        (status = 400, description = "Missing plan_id", body = ErrorResponse),
        (status = 401, description = "No session", body = ErrorResponse)
    ),
    tag = "subscription"
)]
pub async fn upsert_subscription(
    headers: HeaderMap,
    platform: Extension<Arc<Platform>>,
    payload: Option<Json<UpsertSubscriptionRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let Some(plan_id) = request.plan_id.filter(|plan_id| !plan_id.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("plan_id is required")),
        )
            .into_response();
    };

    let cookies = SessionCookies::from_headers(&headers);
    let Some(authed) = resolve_user(&platform, &cookies).await else {
        return unauthorized();
    };

    let current_period_start = Utc::now();
    let current_period_end = current_period_start
        .checked_add_months(Months::new(1))
        .unwrap_or(current_period_start);
    let row = NewSubscription {
        user_id: authed.user.id,
        plan_id,
        status: request.status.unwrap_or(SubscriptionStatus::Active),
        current_period_start,
        current_period_end,
        cancel_at_period_end: false,
    };

    match platform.upsert_subscription(&row).await {
        Ok(subscription) => (
            StatusCode::OK,
            Json(SubscriptionEnvelope {
                subscription: Some(subscription),
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to upsert subscription: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(err.to_string())),
            )
                .into_response()
        }
    }
}

/// Partially update the caller's subscription (cancel flag and/or status).
#[utoipa::path(
    patch,
    path = "/api/subscription",
    request_body = PatchSubscriptionRequest,
    responses(
        (status = 200, description = "Updated subscription", body = SubscriptionEnvelope),
        (status = 400, description = "No fields to update", body = ErrorResponse),
        (status = 401, description = "No session", body = ErrorResponse)
    ),
    tag = "subscription"
)]
pub async fn patch_subscription(
    headers: HeaderMap,
    platform: Extension<Arc<Platform>>,
    payload: Option<Json<PatchSubscriptionRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let patch = SubscriptionPatch {
        cancel_at_period_end: request.cancel_at_period_end,
        status: request.status,
    };
    if patch.is_empty() {
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

    match platform.update_subscription(authed.user.id, &patch).await {
        Ok(subscription) => (
            StatusCode::OK,
            Json(SubscriptionEnvelope {
                subscription: Some(subscription),
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to update subscription: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(err.to_string())),
            )
                .into_response()
        }
    }
}

/// Public pricing data.
#[utoipa::path(
    get,
    path = "/api/plans",
    responses(
        (status = 200, description = "Available plans", body = PlansResponse),
        (status = 500, description = "Plans unavailable", body = ErrorResponse)
    ),
    tag = "subscription"
)]
pub async fn plans(platform: Extension<Arc<Platform>>) -> impl IntoResponse {
    match platform.list_plans().await {
        Ok(plans) => (StatusCode::OK, Json(PlansResponse { plans })).into_response(),
        Err(err) => {
            error!("Failed to fetch plans: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to load plans.")),
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
