//! Route guard: authentication and entitlement gating for page routes.
//!
//! Every non-exempt, non-public request must resolve a user from the session
//! cookies; gated prefixes additionally require an active subscription. The
//! guard's only failure surface is a redirect; it never renders an error.

use axum::{
    extract::{Extension, Request},
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::error;
use url::form_urlencoded;

use crate::api::handlers::auth::session::{
    append_session_cookies, resolve_user, SessionCookies,
};
use crate::api::state::AppState;
use crate::platform::{Platform, PlatformError, Subscription, User};

pub(crate) const LOGIN_PATH: &str = "/auth/login";
pub(crate) const SUBSCRIBE_PATH: &str = "/subscribe";
/// Canonical post-login landing; redirects here omit `redirectedFrom` so the
/// login page is not told to bounce straight back.
pub(crate) const LANDING_PATH: &str = "/studio";

/// Prefixes that bypass all checks.
const PUBLIC_ROUTES: &[&str] = &["/auth/login", "/auth/register", "/auth/reset-password"];

/// Prefixes that additionally require an active subscription.
const GATED_ROUTES: &[&str] = &["/studio", "/account/settings"];

/// Surfaces the guard never applies to: the API (self-authenticating), auth
/// flows, infra endpoints, and static assets.
const EXEMPT_PREFIXES: &[&str] = &["/api", "/auth", "/assets", "/swagger-ui", "/api-docs"];

/// Identity forwarded to page handlers once the guard admits a request.
#[derive(Clone)]
pub struct CurrentUser {
    pub user: User,
    pub access_token: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RouteClass {
    Exempt,
    Public,
    Protected,
    Gated,
}

pub(crate) fn classify_path(path: &str) -> RouteClass {
    if PUBLIC_ROUTES.iter().any(|route| path.starts_with(route)) {
        return RouteClass::Public;
    }
    let is_asset = path
        .rsplit('/')
        .next()
        .is_some_and(|segment| segment.contains('.'));
    if path == "/health" || is_asset || EXEMPT_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
    {
        return RouteClass::Exempt;
    }
    if GATED_ROUTES.iter().any(|route| path.starts_with(route)) {
        return RouteClass::Gated;
    }
    RouteClass::Protected
}

pub(crate) fn login_redirect(path: &str) -> String {
    if path == LANDING_PATH {
        return LOGIN_PATH.to_string();
    }
    format!("{LOGIN_PATH}?{}", redirected_from(path))
}

pub(crate) fn subscribe_redirect(path: &str) -> String {
    format!("{SUBSCRIBE_PATH}?{}", redirected_from(path))
}

fn redirected_from(path: &str) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("redirectedFrom", path)
        .finish()
}

/// Entitlement collapse: a lookup error, an absent row, and a non-active
/// status are uniformly "not entitled".
pub(crate) fn entitled(outcome: &Result<Option<Subscription>, PlatformError>) -> bool {
    matches!(outcome, Ok(Some(subscription)) if subscription.status.is_active())
}

fn redirect(location: String) -> Response {
    match HeaderValue::from_str(&location) {
        Ok(value) => {
            let mut headers = HeaderMap::new();
            headers.insert(LOCATION, value);
            (StatusCode::FOUND, headers).into_response()
        }
        Err(_) => StatusCode::FOUND.into_response(),
    }
}

/// Per-request pipeline: Exempt/Public pass; else CheckAuth, then for gated
/// prefixes CheckSubscription; auth always precedes the subscription lookup,
/// and each is a single attempt.
pub(crate) async fn guard(
    Extension(platform): Extension<Arc<Platform>>,
    Extension(state): Extension<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let class = classify_path(&path);
    if matches!(class, RouteClass::Exempt | RouteClass::Public) {
        return next.run(request).await;
    }

    let cookies = SessionCookies::from_headers(request.headers());
    let authed = if cookies.is_empty() {
        None
    } else {
        resolve_user(&platform, &cookies).await
    };
    let Some(authed) = authed else {
        return redirect(login_redirect(&path));
    };

    if class == RouteClass::Gated {
        let outcome = platform
            .subscription_for_user(&authed.access_token, authed.user.id)
            .await;
        if let Err(err) = &outcome {
            error!("Failed to look up subscription: {err}");
        }
        if !entitled(&outcome) {
            return redirect(subscribe_redirect(&path));
        }
    }

    let refreshed = authed.refreshed.clone();
    request.extensions_mut().insert(CurrentUser {
        user: authed.user,
        access_token: authed.access_token,
    });
    let mut response = next.run(request).await;
    // Token refresh is a side channel: forward the new cookie pair.
    if let Some(session) = refreshed {
        append_session_cookies(response.headers_mut(), &session, state.config());
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::SubscriptionStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn subscription(status: SubscriptionStatus) -> Subscription {
        Subscription {
            id: None,
            user_id: Uuid::nil(),
            plan_id: "pro".to_string(),
            status,
            current_period_start: Utc::now(),
            current_period_end: Utc::now(),
            cancel_at_period_end: false,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn public_routes_bypass_everything() {
        assert_eq!(classify_path("/auth/login"), RouteClass::Public);
        assert_eq!(classify_path("/auth/register"), RouteClass::Public);
        assert_eq!(classify_path("/auth/reset-password"), RouteClass::Public);
    }

    #[test]
    fn api_auth_assets_and_health_are_exempt() {
        assert_eq!(classify_path("/api/subscription"), RouteClass::Exempt);
        assert_eq!(classify_path("/auth/verify-email"), RouteClass::Exempt);
        assert_eq!(classify_path("/favicon.ico"), RouteClass::Exempt);
        assert_eq!(classify_path("/assets/logo.svg"), RouteClass::Exempt);
        assert_eq!(classify_path("/health"), RouteClass::Exempt);
        assert_eq!(classify_path("/swagger-ui"), RouteClass::Exempt);
    }

    #[test]
    fn gated_prefixes_require_entitlement() {
        assert_eq!(classify_path("/studio"), RouteClass::Gated);
        assert_eq!(classify_path("/studio/project/42"), RouteClass::Gated);
        assert_eq!(classify_path("/account/settings"), RouteClass::Gated);
    }

    #[test]
    fn everything_else_requires_auth_only() {
        assert_eq!(classify_path("/"), RouteClass::Protected);
        assert_eq!(classify_path("/subscribe"), RouteClass::Protected);
        assert_eq!(classify_path("/account"), RouteClass::Protected);
    }

    #[test]
    fn login_redirect_preserves_origin_except_for_landing() {
        assert_eq!(login_redirect("/studio"), "/auth/login");
        assert_eq!(
            login_redirect("/account/settings"),
            "/auth/login?redirectedFrom=%2Faccount%2Fsettings"
        );
        assert_eq!(login_redirect("/"), "/auth/login?redirectedFrom=%2F");
    }

    #[test]
    fn subscribe_redirect_always_preserves_origin() {
        assert_eq!(
            subscribe_redirect("/studio"),
            "/subscribe?redirectedFrom=%2Fstudio"
        );
        assert_eq!(
            subscribe_redirect("/account/settings"),
            "/subscribe?redirectedFrom=%2Faccount%2Fsettings"
        );
    }

    #[test]
    fn entitlement_requires_an_active_row() {
        assert!(entitled(&Ok(Some(subscription(SubscriptionStatus::Active)))));
        assert!(!entitled(&Ok(Some(subscription(
            SubscriptionStatus::PastDue
        )))));
        assert!(!entitled(&Ok(Some(subscription(
            SubscriptionStatus::Trialing
        )))));
        assert!(!entitled(&Ok(None)));
        assert!(!entitled(&Err(PlatformError::Rejected {
            status: 500,
            code: None,
            message: "lookup failed".to_string(),
        })));
    }
}
