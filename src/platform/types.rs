//! Projections of platform-owned records.
//!
//! Every entity here is owned and persisted by the platform; these types are
//! request-scoped views deserialized from its responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Metadata keys the product stores on the platform's user record.
const META_FIRST_NAME: &str = "first_name";
const META_LAST_NAME: &str = "last_name";
const META_PHONE_NUMBER: &str = "phone_number";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl User {
    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.user_metadata.get(key).and_then(serde_json::Value::as_str)
    }

    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.metadata_str(META_FIRST_NAME)
    }

    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        self.metadata_str(META_LAST_NAME)
    }

    #[must_use]
    pub fn phone_number(&self) -> Option<&str> {
        self.metadata_str(META_PHONE_NUMBER)
    }

    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

/// Token pair minted by the platform. Either fully present or absent; no
/// partial-session state is ever surfaced to handlers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Which one-time token is being redeemed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpType {
    Signup,
    Recovery,
}

impl OtpType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::Recovery => "recovery",
        }
    }
}

/// Sign-up acknowledgement; the account stays pending until the email link
/// is followed.
#[derive(Debug, Deserialize)]
pub struct SignUpResponse {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub confirmation_sent_at: Option<DateTime<Utc>>,
}

/// One-time code redemption result. The platform sometimes returns a full
/// session and sometimes only the user, so both halves are optional.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyOtpResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub user: Option<User>,
}

impl VerifyOtpResponse {
    /// Session carried in the redemption response, when the platform minted one.
    #[must_use]
    pub fn into_session(self) -> Option<Session> {
        match (self.access_token, self.refresh_token) {
            (Some(access_token), Some(refresh_token)) => Some(Session {
                access_token,
                refresh_token,
                expires_in: self.expires_in,
                user: self.user,
            }),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    PastDue,
    Trialing,
    Incomplete,
}

impl SubscriptionStatus {
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Row in the platform's `subscriptions` table; at most one per user
/// (`user_id` is the upsert key).
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Subscription {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub plan_id: String,
    pub status: SubscriptionStatus,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Upsert payload for `subscriptions`.
#[derive(Debug, Serialize)]
pub struct NewSubscription {
    pub user_id: Uuid,
    pub plan_id: String,
    pub status: SubscriptionStatus,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub cancel_at_period_end: bool,
}

/// Partial update for `subscriptions` (cancel flag and/or status).
#[derive(Debug, Default, Serialize)]
pub struct SubscriptionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_at_period_end: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SubscriptionStatus>,
}

impl SubscriptionPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cancel_at_period_end.is_none() && self.status.is_none()
    }
}

/// Row in the platform's `plans` table, read-only pricing data.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Plan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price_monthly: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    #[test]
    fn user_reads_profile_fields_from_metadata() -> Result<()> {
        let user: User = serde_json::from_value(json!({
            "id": Uuid::nil(),
            "email": "alice@example.com",
            "user_metadata": {
                "first_name": "Alice",
                "last_name": "Doe",
                "phone_number": "+15550100"
            }
        }))?;
        assert_eq!(user.first_name(), Some("Alice"));
        assert_eq!(user.last_name(), Some("Doe"));
        assert_eq!(user.phone_number(), Some("+15550100"));
        assert!(!user.is_confirmed());
        Ok(())
    }

    #[test]
    fn verify_otp_response_requires_both_tokens_for_a_session() {
        let full = VerifyOtpResponse {
            access_token: Some("access".to_string()),
            refresh_token: Some("refresh".to_string()),
            ..VerifyOtpResponse::default()
        };
        assert!(full.into_session().is_some());

        let partial = VerifyOtpResponse {
            access_token: Some("access".to_string()),
            ..VerifyOtpResponse::default()
        };
        assert!(partial.into_session().is_none());
    }

    #[test]
    fn subscription_status_wire_names() -> Result<()> {
        assert_eq!(
            serde_json::to_value(SubscriptionStatus::PastDue)?,
            json!("past_due")
        );
        let status: SubscriptionStatus = serde_json::from_value(json!("trialing"))?;
        assert_eq!(status, SubscriptionStatus::Trialing);
        assert!(!status.is_active());
        assert!(SubscriptionStatus::Active.is_active());
        Ok(())
    }

    #[test]
    fn subscription_patch_skips_absent_fields() -> Result<()> {
        let patch = SubscriptionPatch {
            cancel_at_period_end: Some(true),
            status: None,
        };
        assert!(!patch.is_empty());
        assert_eq!(
            serde_json::to_value(&patch)?,
            json!({ "cancel_at_period_end": true })
        );
        assert!(SubscriptionPatch::default().is_empty());
        Ok(())
    }

    #[test]
    fn otp_type_as_str_matches_wire_values() {
        assert_eq!(OtpType::Signup.as_str(), "signup");
        assert_eq!(OtpType::Recovery.as_str(), "recovery");
    }
}
