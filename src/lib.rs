//! # Atelier (design collaboration studio server)
//!
//! `atelier` serves the product's web surface: marketing pages, auth flows,
//! subscription gating, and the studio editor shell. Nearly every behavior is
//! a thin layer over a hosted identity/data platform reached through the
//! [`platform`] client; this crate owns no credential storage, no token
//! issuance, and no table schema.
//!
//! ## Route Guard
//!
//! Every page request passes the guard in [`api::guard`]: public paths pass
//! untouched, everything else needs a cookie session, and gated prefixes
//! (`/studio`, `/account/settings`) additionally need an active subscription
//! row. The guard's only failure behavior is a redirect.
//!
//! ## Email-link flows
//!
//! Verification and password recovery share one explicit state machine
//! (`api::handlers::auth::machine`): URL parameters are classified in a fixed
//! priority order (platform errors first), each exchange is a single call,
//! and the verified state never reverts. Resends sit behind a per-address
//! cooldown with local rejection.

pub mod api;
pub mod cli;
pub mod platform;
pub mod studio;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
