//! Auth flows: credentials, sessions, email-link verification, and resends.
//!
//! Local validation always runs before any platform call, and platform
//! rejections pass through to the caller largely verbatim. The one substring
//! special case (an unverified email at sign-in) changes the response
//! affordance rather than just the message.

pub(crate) mod login;
pub mod machine;
pub mod rate_limit;
pub(crate) mod recovery;
pub(crate) mod session;
pub(crate) mod signup;
pub(crate) mod types;
mod validate;
pub(crate) mod verify;

#[cfg(test)]
pub(crate) mod test_support;

pub use rate_limit::{
    CooldownDecision, CooldownStore, NoopResendLimiter, ResendLimiter,
    DEFAULT_RESEND_COOLDOWN_SECONDS,
};
