//! Error taxonomy at the platform boundary.

use std::time::Duration;
use thiserror::Error;

/// Failure surfaced by a platform call.
///
/// `Rejected` carries the platform's own message largely verbatim so handlers
/// can pass it through to the caller; the remaining variants never expose
/// platform internals.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The platform answered with a non-success status.
    #[error("{message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The call did not complete within the configured deadline.
    #[error("platform call exceeded the {0:?} deadline")]
    Deadline(Duration),

    /// The request never produced a platform answer.
    #[error("platform request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The platform answered 2xx but the payload did not match the contract.
    #[error("platform response could not be decoded: {0}")]
    Decode(String),
}

impl PlatformError {
    /// Substring special case: an unverified account at sign-in changes the
    /// UI affordance (show resend), not just the message.
    #[must_use]
    pub fn is_email_not_confirmed(&self) -> bool {
        match self {
            Self::Rejected { message, .. } => {
                let lower = message.to_lowercase();
                lower.contains("email not confirmed") || lower.contains("not verified")
            }
            _ => false,
        }
    }

    /// Single-object reads report "no row" as an error; callers map it to `None`.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Rejected { status, code, .. } => {
                code.as_deref() == Some("PGRST116") || *status == 404 || *status == 406
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Rejected { status: 401, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(status: u16, code: Option<&str>, message: &str) -> PlatformError {
        PlatformError::Rejected {
            status,
            code: code.map(str::to_string),
            message: message.to_string(),
        }
    }

    #[test]
    fn email_not_confirmed_matches_both_substrings() {
        assert!(rejected(400, None, "Email not confirmed").is_email_not_confirmed());
        assert!(rejected(400, None, "account not verified yet").is_email_not_confirmed());
        assert!(!rejected(400, None, "Invalid login credentials").is_email_not_confirmed());
    }

    #[test]
    fn not_found_matches_code_and_status() {
        assert!(rejected(406, Some("PGRST116"), "no rows").is_not_found());
        assert!(rejected(404, None, "missing").is_not_found());
        assert!(!rejected(500, None, "boom").is_not_found());
    }

    #[test]
    fn unauthorized_only_on_401() {
        assert!(rejected(401, None, "invalid token").is_unauthorized());
        assert!(!rejected(403, None, "forbidden").is_unauthorized());
        assert!(!PlatformError::Deadline(Duration::from_secs(10)).is_unauthorized());
    }

    #[test]
    fn rejected_displays_platform_message() {
        let err = rejected(400, None, "Token has expired or is invalid");
        assert_eq!(err.to_string(), "Token has expired or is invalid");
    }
}
