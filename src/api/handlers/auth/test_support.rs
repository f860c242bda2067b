//! Shared fixtures for handler tests.
//!
//! The platform points at an unroutable loopback port: tests exercise only
//! paths that return before any network call, or that treat a failed call as
//! a normal outcome.

use secrecy::SecretString;
use std::sync::Arc;

use crate::api::state::{AppConfig, AppState};
use crate::platform::{Platform, PlatformConfig};
use crate::studio::StudioStore;

use super::rate_limit::NoopResendLimiter;

pub(crate) fn platform() -> Arc<Platform> {
    let config = PlatformConfig::new(
        "http://127.0.0.1:9".to_string(),
        SecretString::from("anon-key".to_string()),
        SecretString::from("service-role-key".to_string()),
        "http://localhost:8080".to_string(),
    )
    .with_deadline_seconds(1);
    Arc::new(Platform::new(config).expect("test platform"))
}

pub(crate) fn state() -> Arc<AppState> {
    Arc::new(AppState::new(
        AppConfig::new("http://localhost:8080".to_string()),
        Arc::new(NoopResendLimiter),
        StudioStore::new(),
    ))
}
