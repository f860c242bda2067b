//! Email-link verification and recovery state machine.
//!
//! Links issued by the platform land with one of several parameter shapes in
//! the query string and/or fragment. This module turns a raw URL into a
//! [`LinkDisposition`] (which exchange to attempt, if any) and drives an
//! explicit [`VerificationState`] through tagged transitions, so the flow can
//! be tested without any rendering or network.

use std::collections::HashMap;
use url::form_urlencoded;

use crate::platform::OtpType;

/// Fallback when the link carries error markers but no usable description.
pub const GENERIC_LINK_ERROR: &str = "Verification link is invalid or expired";

/// Fallback when a token exchange fails without a platform message.
pub const GENERIC_EXCHANGE_ERROR: &str = "Verification failed. The link may be expired.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationState {
    Idle,
    Verifying,
    Verified,
    Error(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyEvent {
    /// An exchange was dispatched.
    Begin,
    /// The exchange (or session adoption) succeeded.
    Succeed,
    /// The link carried an error marker, or an exchange failed.
    Fail(String),
}

impl VerificationState {
    /// Transition on an event. `Verified` is absorbing: once reached, nothing
    /// reverts it. `Fail` is accepted from `Idle` as well, because a
    /// platform-issued error parameter terminates the flow before any
    /// exchange begins.
    #[must_use]
    pub fn apply(self, event: VerifyEvent) -> Self {
        match (self, event) {
            (Self::Verified, _) => Self::Verified,
            (_, VerifyEvent::Begin) => Self::Verifying,
            (Self::Verifying, VerifyEvent::Succeed) => Self::Verified,
            (_, VerifyEvent::Fail(message)) => Self::Error(message),
            // A success that was never started changes nothing.
            (state, VerifyEvent::Succeed) => state,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Verifying => "verifying",
            Self::Verified => "verified",
            Self::Error(_) => "error",
        }
    }
}

/// Parameters an email link can carry, collected from query and fragment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkParams {
    pub code: Option<String>,
    pub token: Option<String>,
    pub link_type: Option<OtpType>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub error_code: Option<String>,
    pub error_description: Option<String>,
}

impl LinkParams {
    /// Collect parameters; the query string takes priority over the fragment
    /// for every key, and values arrive percent-decoded.
    #[must_use]
    pub fn from_parts(query: Option<&str>, fragment: Option<&str>) -> Self {
        let query_pairs = parse_pairs(query);
        let fragment_pairs = parse_pairs(fragment);
        let get = |key: &str| {
            query_pairs
                .get(key)
                .or_else(|| fragment_pairs.get(key))
                .cloned()
        };

        Self {
            code: get("code"),
            token: get("token").or_else(|| get("token_hash")),
            link_type: get("type").as_deref().and_then(parse_link_type),
            access_token: get("access_token"),
            refresh_token: get("refresh_token"),
            error_code: get("error_code"),
            error_description: get("error_description"),
        }
    }
}

fn parse_pairs(raw: Option<&str>) -> HashMap<String, String> {
    raw.map_or_else(HashMap::new, |raw| {
        form_urlencoded::parse(raw.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    })
}

fn parse_link_type(raw: &str) -> Option<OtpType> {
    match raw {
        "signup" => Some(OtpType::Signup),
        "recovery" => Some(OtpType::Recovery),
        _ => None,
    }
}

/// What the link asks for, in priority order; first match wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkDisposition {
    /// The platform already rejected the link; never overridden by any token
    /// parameters riding in the same URL.
    PlatformError { message: String },
    /// A full token pair with a type marker: adopt the session directly.
    AdoptSession {
        access_token: String,
        refresh_token: String,
        link_type: OtpType,
    },
    /// A single opaque token with a type marker: one-time exchange.
    ExchangeToken {
        token_hash: String,
        link_type: OtpType,
    },
    /// The alternate signup shape carrying a one-shot code.
    ExchangeCode { code: String },
    /// Nothing recognizable; the caller shows the waiting screen.
    AwaitEmail,
}

#[must_use]
pub fn classify(params: &LinkParams) -> LinkDisposition {
    if params.error_code.is_some() || params.error_description.is_some() {
        let message = params
            .error_description
            .clone()
            .filter(|description| !description.is_empty())
            .unwrap_or_else(|| GENERIC_LINK_ERROR.to_string());
        return LinkDisposition::PlatformError { message };
    }

    if let (Some(link_type), Some(access_token), Some(refresh_token)) = (
        params.link_type,
        params.access_token.as_ref(),
        params.refresh_token.as_ref(),
    ) {
        return LinkDisposition::AdoptSession {
            access_token: access_token.clone(),
            refresh_token: refresh_token.clone(),
            link_type,
        };
    }

    if let (Some(link_type), Some(token)) = (params.link_type, params.token.as_ref()) {
        return LinkDisposition::ExchangeToken {
            token_hash: token.clone(),
            link_type,
        };
    }

    if let Some(code) = params.code.as_ref() {
        return LinkDisposition::ExchangeCode { code: code.clone() };
    }

    LinkDisposition::AwaitEmail
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        let state = VerificationState::Idle
            .apply(VerifyEvent::Begin)
            .apply(VerifyEvent::Succeed);
        assert_eq!(state, VerificationState::Verified);
    }

    #[test]
    fn failed_exchange_reaches_error_with_message() {
        let state = VerificationState::Idle
            .apply(VerifyEvent::Begin)
            .apply(VerifyEvent::Fail("Token has expired".to_string()));
        assert_eq!(
            state,
            VerificationState::Error("Token has expired".to_string())
        );
        assert_eq!(state.label(), "error");
    }

    #[test]
    fn verified_never_reverts() {
        let verified = VerificationState::Verified;
        assert_eq!(
            verified.clone().apply(VerifyEvent::Fail("late".to_string())),
            VerificationState::Verified
        );
        assert_eq!(
            verified.apply(VerifyEvent::Begin),
            VerificationState::Verified
        );
    }

    #[test]
    fn error_params_fail_without_a_begin() {
        let state =
            VerificationState::Idle.apply(VerifyEvent::Fail(GENERIC_LINK_ERROR.to_string()));
        assert_eq!(
            state,
            VerificationState::Error(GENERIC_LINK_ERROR.to_string())
        );
    }

    #[test]
    fn stray_success_in_idle_changes_nothing() {
        assert_eq!(
            VerificationState::Idle.apply(VerifyEvent::Succeed),
            VerificationState::Idle
        );
    }

    #[test]
    fn params_prefer_query_over_fragment() {
        let params = LinkParams::from_parts(
            Some("type=signup&token=from-query"),
            Some("token=from-fragment&refresh_token=r"),
        );
        assert_eq!(params.token.as_deref(), Some("from-query"));
        assert_eq!(params.refresh_token.as_deref(), Some("r"));
        assert_eq!(params.link_type, Some(OtpType::Signup));
    }

    #[test]
    fn params_decode_percent_escapes() {
        let params = LinkParams::from_parts(
            Some("error_description=Email%20link%20is%20invalid%20or%20has%20expired"),
            None,
        );
        assert_eq!(
            params.error_description.as_deref(),
            Some("Email link is invalid or has expired")
        );
    }

    #[test]
    fn unknown_type_marker_is_ignored() {
        let params = LinkParams::from_parts(Some("type=magiclink&token=t"), None);
        assert_eq!(params.link_type, None);
        assert_eq!(classify(&params), LinkDisposition::AwaitEmail);
    }

    #[test]
    fn error_marker_wins_over_valid_tokens() {
        let params = LinkParams::from_parts(
            Some("error_code=otp_expired&token=still-here&type=recovery"),
            None,
        );
        assert_eq!(
            classify(&params),
            LinkDisposition::PlatformError {
                message: GENERIC_LINK_ERROR.to_string()
            }
        );
    }

    #[test]
    fn token_pair_with_type_adopts_session() {
        let params =
            LinkParams::from_parts(None, Some("type=recovery&access_token=a&refresh_token=r"));
        assert_eq!(
            classify(&params),
            LinkDisposition::AdoptSession {
                access_token: "a".to_string(),
                refresh_token: "r".to_string(),
                link_type: OtpType::Recovery,
            }
        );
    }

    #[test]
    fn single_token_with_type_exchanges() {
        let params = LinkParams::from_parts(Some("type=signup&token=opaque"), None);
        assert_eq!(
            classify(&params),
            LinkDisposition::ExchangeToken {
                token_hash: "opaque".to_string(),
                link_type: OtpType::Signup,
            }
        );
    }

    #[test]
    fn token_hash_spelling_is_accepted() {
        let params = LinkParams::from_parts(Some("type=recovery&token_hash=opaque"), None);
        assert_eq!(
            classify(&params),
            LinkDisposition::ExchangeToken {
                token_hash: "opaque".to_string(),
                link_type: OtpType::Recovery,
            }
        );
    }

    #[test]
    fn bare_code_exchanges_without_a_type_marker() {
        let params = LinkParams::from_parts(Some("code=one-shot"), None);
        assert_eq!(
            classify(&params),
            LinkDisposition::ExchangeCode {
                code: "one-shot".to_string()
            }
        );
    }

    #[test]
    fn empty_url_waits_for_email() {
        let params = LinkParams::from_parts(None, None);
        assert_eq!(classify(&params), LinkDisposition::AwaitEmail);
    }
}
