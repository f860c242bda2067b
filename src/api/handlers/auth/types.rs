//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::platform::User;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Shared shape for resend-confirmation and forgot-password.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub confirm_password: String,
}

/// User projection handed to clients; profile fields come from metadata.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email_confirmed: bool,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name().map(str::to_string),
            last_name: user.last_name().map(str::to_string),
            phone: user
                .phone_number()
                .map(str::to_string)
                .or_else(|| user.phone.clone()),
            email_confirmed: user.is_confirmed(),
        }
    }
}

#[derive(ToSchema, Serialize, Debug)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_seconds: Option<u64>,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cooldown_seconds: None,
        }
    }

    pub(crate) fn with_cooldown(mut self, seconds: u64) -> Self {
        self.cooldown_seconds = Some(seconds);
        self
    }
}

#[derive(ToSchema, Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_verification: Option<bool>,
}

impl ErrorResponse {
    pub(crate) fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            needs_verification: None,
        }
    }

    pub(crate) fn needs_verification(mut self) -> Self {
        self.needs_verification = Some(true);
        self
    }
}

/// Per-field validation failures, detected before any platform call.
#[derive(ToSchema, Serialize, Debug)]
pub struct FieldErrorResponse {
    pub errors: BTreeMap<String, String>,
    /// Strength score for the submitted password, when one was present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_strength: Option<u8>,
}

/// Outcome of an email-link flow (verification or recovery landing).
#[derive(ToSchema, Serialize, Debug)]
pub struct FlowResponse {
    /// idle | verifying | verified | ready | success | error
    pub state: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_after_ms: Option<u64>,
    /// Window for the client-side resend countdown, when resend is offered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_seconds: Option<u64>,
}

impl FlowResponse {
    pub(crate) fn new(state: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            message: message.into(),
            redirect_to: None,
            redirect_after_ms: None,
            cooldown_seconds: None,
        }
    }

    pub(crate) fn redirecting(mut self, to: impl Into<String>, after_ms: u64) -> Self {
        self.redirect_to = Some(to.into());
        self.redirect_after_ms = Some(after_ms);
        self
    }

    pub(crate) fn with_cooldown(mut self, seconds: u64) -> Self {
        self.cooldown_seconds = Some(seconds);
        self
    }
}
