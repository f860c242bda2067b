//! Session cookies and identity resolution from them.

use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::error;

use crate::api::state::{AppConfig, AppState};
use crate::platform::{Platform, Session, User};

use super::types::ProfileResponse;

const ACCESS_COOKIE_NAME: &str = "atelier_access_token";
const REFRESH_COOKIE_NAME: &str = "atelier_refresh_token";

/// Token pair as presented by the caller's cookies.
#[derive(Clone, Debug, Default)]
pub(crate) struct SessionCookies {
    pub(crate) access: Option<String>,
    pub(crate) refresh: Option<String>,
}

impl SessionCookies {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            access: cookie_value(headers, ACCESS_COOKIE_NAME),
            refresh: cookie_value(headers, REFRESH_COOKIE_NAME),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none()
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == name && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}

/// Caller identity resolved from cookies. `refreshed` carries a replacement
/// cookie pair when validation had to refresh the session.
pub(crate) struct AuthedUser {
    pub(crate) user: User,
    pub(crate) access_token: String,
    pub(crate) refreshed: Option<Session>,
}

/// Resolve the caller: validate the access token, then attempt at most one
/// refresh. Every failure collapses to `None`; callers redirect or 401 and
/// never distinguish why.
pub(crate) async fn resolve_user(
    platform: &Platform,
    cookies: &SessionCookies,
) -> Option<AuthedUser> {
    if let Some(access_token) = &cookies.access {
        match platform.get_user(access_token).await {
            Ok(user) => {
                return Some(AuthedUser {
                    user,
                    access_token: access_token.clone(),
                    refreshed: None,
                });
            }
            Err(err) if err.is_unauthorized() => {}
            Err(err) => {
                error!("Failed to resolve user: {err}");
                return None;
            }
        }
    }

    let refresh_token = cookies.refresh.as_ref()?;
    match platform.refresh_session(refresh_token).await {
        Ok(session) => session.user.clone().map(|user| AuthedUser {
            user,
            access_token: session.access_token.clone(),
            refreshed: Some(session),
        }),
        Err(err) => {
            error!("Failed to refresh session: {err}");
            None
        }
    }
}

/// Set both session cookies from a platform session.
pub(crate) fn append_session_cookies(headers: &mut HeaderMap, session: &Session, config: &AppConfig) {
    let access_ttl = session
        .expires_in
        .unwrap_or_else(|| config.access_cookie_ttl_seconds());
    let secure = config.session_cookie_secure();
    if let Ok(cookie) = build_cookie(ACCESS_COOKIE_NAME, &session.access_token, access_ttl, secure)
    {
        headers.append(SET_COOKIE, cookie);
    }
    if let Ok(cookie) = build_cookie(
        REFRESH_COOKIE_NAME,
        &session.refresh_token,
        config.refresh_cookie_ttl_seconds(),
        secure,
    ) {
        headers.append(SET_COOKIE, cookie);
    }
}

/// Expire both session cookies.
pub(crate) fn append_clear_cookies(headers: &mut HeaderMap, config: &AppConfig) {
    let secure = config.session_cookie_secure();
    for name in [ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME] {
        if let Ok(cookie) = build_cookie(name, "", 0, secure) {
            headers.append(SET_COOKIE, cookie);
        }
    }
}

fn build_cookie(
    name: &str,
    value: &str,
    max_age: i64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Report the session behind the caller's cookies.
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Session is active", body = ProfileResponse),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(
    headers: HeaderMap,
    platform: Extension<Arc<Platform>>,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    // Missing cookies are treated as "no session" to avoid leaking auth state.
    let cookies = SessionCookies::from_headers(&headers);
    if cookies.is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }

    match resolve_user(&platform, &cookies).await {
        Some(authed) => {
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
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Invalidate the platform session and clear cookies.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    platform: Extension<Arc<Platform>>,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let cookies = SessionCookies::from_headers(&headers);
    if let Some(access_token) = &cookies.access {
        if let Err(err) = platform.sign_out(access_token).await {
            error!("Failed to sign out: {err}");
        }
    }

    // Always clear the cookies, even if the platform call failed.
    let mut response_headers = HeaderMap::new();
    append_clear_cookies(&mut response_headers, state.config());
    (StatusCode::NO_CONTENT, response_headers).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::new("https://atelier.studio".to_string())
    }

    fn session_pair() -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_in: Some(900),
            user: None,
        }
    }

    #[test]
    fn cookies_parse_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static(
                "atelier_access_token=abc; other=1; atelier_refresh_token=def",
            ),
        );
        let cookies = SessionCookies::from_headers(&headers);
        assert_eq!(cookies.access.as_deref(), Some("abc"));
        assert_eq!(cookies.refresh.as_deref(), Some("def"));
        assert!(!cookies.is_empty());
    }

    #[test]
    fn missing_or_empty_cookies_are_none() {
        let cookies = SessionCookies::from_headers(&HeaderMap::new());
        assert!(cookies.is_empty());

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("atelier_access_token="));
        let cookies = SessionCookies::from_headers(&headers);
        assert!(cookies.access.is_none());
    }

    #[test]
    fn session_cookies_carry_ttl_and_secure_flag() {
        let mut headers = HeaderMap::new();
        append_session_cookies(&mut headers, &session_pair(), &config());

        let cookies: Vec<&str> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with("atelier_access_token=access;"));
        assert!(cookies[0].contains("Max-Age=900"));
        assert!(cookies[0].contains("HttpOnly"));
        assert!(cookies[0].ends_with("; Secure"));
        assert!(cookies[1].starts_with("atelier_refresh_token=refresh;"));
    }

    #[test]
    fn clear_cookies_expire_both_names() {
        let mut headers = HeaderMap::new();
        append_clear_cookies(&mut headers, &config());

        let cookies: Vec<&str> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|cookie| cookie.contains("Max-Age=0")));
    }
}
