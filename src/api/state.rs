//! Application state and configuration shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::api::handlers::auth::ResendLimiter;
use crate::studio::StudioStore;

const DEFAULT_RESEND_COOLDOWN_SECONDS: u64 = 60;
const DEFAULT_ACCESS_COOKIE_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_REFRESH_COOKIE_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AppConfig {
    site_url: String,
    resend_cooldown_seconds: u64,
    access_cookie_ttl_seconds: i64,
    refresh_cookie_ttl_seconds: i64,
}

impl AppConfig {
    #[must_use]
    pub fn new(site_url: String) -> Self {
        Self {
            site_url: site_url.trim_end_matches('/').to_string(),
            resend_cooldown_seconds: DEFAULT_RESEND_COOLDOWN_SECONDS,
            access_cookie_ttl_seconds: DEFAULT_ACCESS_COOKIE_TTL_SECONDS,
            refresh_cookie_ttl_seconds: DEFAULT_REFRESH_COOKIE_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_resend_cooldown_seconds(mut self, seconds: u64) -> Self {
        self.resend_cooldown_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_access_cookie_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_cookie_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_cookie_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_cookie_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    #[must_use]
    pub fn resend_cooldown_seconds(&self) -> u64 {
        self.resend_cooldown_seconds
    }

    #[must_use]
    pub fn resend_cooldown(&self) -> Duration {
        Duration::from_secs(self.resend_cooldown_seconds)
    }

    pub(crate) fn access_cookie_ttl_seconds(&self) -> i64 {
        self.access_cookie_ttl_seconds
    }

    pub(crate) fn refresh_cookie_ttl_seconds(&self) -> i64 {
        self.refresh_cookie_ttl_seconds
    }

    /// Only mark cookies secure when the site is served over HTTPS.
    pub(crate) fn session_cookie_secure(&self) -> bool {
        self.site_url.starts_with("https://")
    }
}

pub struct AppState {
    config: AppConfig,
    limiter: Arc<dyn ResendLimiter>,
    studio: StudioStore,
}

impl AppState {
    pub fn new(config: AppConfig, limiter: Arc<dyn ResendLimiter>, studio: StudioStore) -> Self {
        Self {
            config,
            limiter,
            studio,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub(crate) fn limiter(&self) -> &dyn ResendLimiter {
        self.limiter.as_ref()
    }

    #[must_use]
    pub fn studio(&self) -> &StudioStore {
        &self.studio
    }
}
