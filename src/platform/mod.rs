//! Client for the hosted identity/data platform.
//!
//! Credential storage, password hashing, token issuance, and the relational
//! tables (`subscriptions`, `plans`) all live on the platform; this module is
//! the only place that talks to it. The client is constructed once at startup
//! and injected into handlers, never reached through an ambient singleton, so
//! tests can point it at whatever address they like.
//!
//! Every call is a single attempt under an explicit deadline; retries are a
//! caller-level policy and none of the flows here use one.

mod auth;
mod error;
mod tables;
mod types;

pub use auth::{SignUpParams, UserUpdate};
pub use error::PlatformError;
pub use types::{
    NewSubscription, OtpType, Plan, Session, SignUpResponse, Subscription, SubscriptionPatch,
    SubscriptionStatus, User, VerifyOtpResponse,
};

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use tracing::Instrument;
use url::Url;

const DEFAULT_DEADLINE_SECONDS: u64 = 10;

/// Connection settings for the platform, from CLI/env configuration.
#[derive(Clone, Debug)]
pub struct PlatformConfig {
    base_url: String,
    anon_key: SecretString,
    service_role_key: SecretString,
    site_url: String,
    deadline: Duration,
}

impl PlatformConfig {
    #[must_use]
    pub fn new(
        base_url: String,
        anon_key: SecretString,
        service_role_key: SecretString,
        site_url: String,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            service_role_key,
            site_url: site_url.trim_end_matches('/').to_string(),
            deadline: Duration::from_secs(DEFAULT_DEADLINE_SECONDS),
        }
    }

    #[must_use]
    pub fn with_deadline_seconds(mut self, seconds: u64) -> Self {
        self.deadline = Duration::from_secs(seconds);
        self
    }

    /// Public site origin used to build email redirect links.
    #[must_use]
    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    #[must_use]
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

pub struct Platform {
    http: Client,
    config: PlatformConfig,
}

impl Platform {
    /// Build a client for the configured platform.
    ///
    /// # Errors
    /// Returns an error if the base URL does not parse or the HTTP client
    /// cannot be constructed.
    pub fn new(config: PlatformConfig) -> Result<Self> {
        Url::parse(&config.base_url)
            .with_context(|| format!("Invalid platform URL: {}", config.base_url))?;
        let http = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("Failed to build platform HTTP client")?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn anon_key(&self) -> &str {
        self.config.anon_key.expose_secret()
    }

    pub(crate) fn service_role_key(&self) -> &str {
        self.config.service_role_key.expose_secret()
    }

    /// Issue the request under the configured deadline.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        span: tracing::Span,
    ) -> Result<T, PlatformError> {
        let response = self.dispatch(request, span).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| PlatformError::Decode(err.to_string()))
    }

    /// Same as [`execute`](Self::execute) for endpoints whose body we discard.
    pub(crate) async fn execute_empty(
        &self,
        request: RequestBuilder,
        span: tracing::Span,
    ) -> Result<(), PlatformError> {
        self.dispatch(request, span).await.map(|_| ())
    }

    async fn dispatch(
        &self,
        request: RequestBuilder,
        span: tracing::Span,
    ) -> Result<reqwest::Response, PlatformError> {
        let deadline = self.config.deadline;
        let outcome = async { timeout(deadline, request.send()).await }
            .instrument(span)
            .await;
        let response = match outcome {
            Err(_elapsed) => return Err(PlatformError::Deadline(deadline)),
            Ok(sent) => sent?,
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let value: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        Err(PlatformError::Rejected {
            status: status.as_u16(),
            code: error_code(&value),
            message: error_message(&value, &body),
        })
    }
}

fn error_message(value: &Value, raw_body: &str) -> String {
    for key in ["msg", "message", "error_description", "error"] {
        if let Some(message) = value.get(key).and_then(Value::as_str) {
            return message.to_string();
        }
    }
    let trimmed = raw_body.trim();
    if trimmed.is_empty() {
        "Request rejected by the platform".to_string()
    } else {
        trimmed.to_string()
    }
}

fn error_code(value: &Value) -> Option<String> {
    for key in ["code", "error_code"] {
        if let Some(code) = value.get(key).and_then(Value::as_str) {
            return Some(code.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> PlatformConfig {
        PlatformConfig::new(
            "https://platform.test/".to_string(),
            SecretString::from("anon".to_string()),
            SecretString::from("service".to_string()),
            "https://atelier.test/".to_string(),
        )
    }

    #[test]
    fn config_trims_trailing_slashes_and_defaults_deadline() {
        let config = config();
        assert_eq!(config.site_url(), "https://atelier.test");
        assert_eq!(
            config.deadline(),
            Duration::from_secs(DEFAULT_DEADLINE_SECONDS)
        );

        let config = config.with_deadline_seconds(3);
        assert_eq!(config.deadline(), Duration::from_secs(3));
    }

    #[test]
    fn endpoint_joins_base_and_path() -> Result<()> {
        let platform = Platform::new(config())?;
        assert_eq!(
            platform.endpoint("/auth/v1/user"),
            "https://platform.test/auth/v1/user"
        );
        Ok(())
    }

    #[test]
    fn new_rejects_unparsable_base_url() {
        let config = PlatformConfig::new(
            "not a url".to_string(),
            SecretString::from("anon".to_string()),
            SecretString::from("service".to_string()),
            "https://atelier.test".to_string(),
        );
        assert!(Platform::new(config).is_err());
    }

    #[test]
    fn error_message_prefers_known_keys() {
        let value = json!({ "msg": "Token has expired", "error": "ignored" });
        assert_eq!(error_message(&value, ""), "Token has expired");

        let value = json!({ "error_description": "Invalid code" });
        assert_eq!(error_message(&value, ""), "Invalid code");

        assert_eq!(error_message(&Value::Null, "  plain body  "), "plain body");
        assert_eq!(
            error_message(&Value::Null, ""),
            "Request rejected by the platform"
        );
    }

    #[test]
    fn error_code_reads_both_spellings() {
        assert_eq!(
            error_code(&json!({ "code": "PGRST116" })).as_deref(),
            Some("PGRST116")
        );
        assert_eq!(
            error_code(&json!({ "error_code": "otp_expired" })).as_deref(),
            Some("otp_expired")
        );
        assert_eq!(error_code(&Value::Null), None);
    }
}
