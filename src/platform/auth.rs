//! Identity operations: credentials, sessions, one-time tokens, profile.

use serde::Serialize;
use serde_json::json;
use tracing::info_span;
use uuid::Uuid;

use super::types::{OtpType, Session, SignUpResponse, User, VerifyOtpResponse};
use super::{Platform, PlatformError};

/// New-account request; profile fields ride along as user metadata.
#[derive(Clone, Debug)]
pub struct SignUpParams {
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

/// Partial user update: password change and/or metadata merge.
#[derive(Debug, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Platform {
    /// Create an account; it stays pending until the emailed link is followed.
    pub async fn sign_up(&self, params: &SignUpParams) -> Result<SignUpResponse, PlatformError> {
        let url = self.endpoint("/auth/v1/signup");
        let redirect = format!("{}/auth/verify-email", self.config().site_url());
        let body = json!({
            "email": params.email,
            "password": params.password,
            "phone": params.phone,
            "data": {
                "first_name": params.first_name,
                "last_name": params.last_name,
                "phone_number": params.phone,
            },
        });
        let span = info_span!("platform.sign_up", http.method = "POST", url = %url);
        let request = self
            .http()
            .post(&url)
            .header("apikey", self.anon_key())
            .query(&[("redirect_to", redirect.as_str())])
            .json(&body);
        self.execute(request, span).await
    }

    /// Exchange credentials for a session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, PlatformError> {
        let url = self.endpoint("/auth/v1/token");
        let span = info_span!("platform.sign_in", http.method = "POST", url = %url);
        let request = self
            .http()
            .post(&url)
            .header("apikey", self.anon_key())
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        self.execute(request, span).await
    }

    /// Exchange a refresh token for a fresh session pair.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session, PlatformError> {
        let url = self.endpoint("/auth/v1/token");
        let span = info_span!("platform.refresh_session", http.method = "POST", url = %url);
        let request = self
            .http()
            .post(&url)
            .header("apikey", self.anon_key())
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }));
        self.execute(request, span).await
    }

    /// Invalidate the session behind the access token.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), PlatformError> {
        let url = self.endpoint("/auth/v1/logout");
        let span = info_span!("platform.sign_out", http.method = "POST", url = %url);
        let request = self
            .http()
            .post(&url)
            .header("apikey", self.anon_key())
            .bearer_auth(access_token);
        self.execute_empty(request, span).await
    }

    /// Resolve the user behind an access token.
    pub async fn get_user(&self, access_token: &str) -> Result<User, PlatformError> {
        let url = self.endpoint("/auth/v1/user");
        let span = info_span!("platform.get_user", http.method = "GET", url = %url);
        let request = self
            .http()
            .get(&url)
            .header("apikey", self.anon_key())
            .bearer_auth(access_token);
        self.execute(request, span).await
    }

    /// Redeem a one-time token from an email link.
    pub async fn verify_otp(
        &self,
        token_hash: &str,
        otp_type: OtpType,
    ) -> Result<VerifyOtpResponse, PlatformError> {
        let url = self.endpoint("/auth/v1/verify");
        let span = info_span!("platform.verify_otp", http.method = "POST", url = %url, otp_type = otp_type.as_str());
        let request = self
            .http()
            .post(&url)
            .header("apikey", self.anon_key())
            .json(&json!({ "token_hash": token_hash, "type": otp_type.as_str() }));
        self.execute(request, span).await
    }

    /// Adopt a token pair handed over in an email-link fragment.
    ///
    /// The access token is validated against the platform; if it is already
    /// stale, exactly one refresh is attempted before giving up.
    pub async fn adopt_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Session, PlatformError> {
        match self.get_user(access_token).await {
            Ok(user) => Ok(Session {
                access_token: access_token.to_string(),
                refresh_token: refresh_token.to_string(),
                expires_in: None,
                user: Some(user),
            }),
            Err(err) if err.is_unauthorized() => self.refresh_session(refresh_token).await,
            Err(err) => Err(err),
        }
    }

    /// Change password and/or merge profile metadata on the user record.
    pub async fn update_user(
        &self,
        access_token: &str,
        update: &UserUpdate,
    ) -> Result<User, PlatformError> {
        let url = self.endpoint("/auth/v1/user");
        let span = info_span!("platform.update_user", http.method = "PUT", url = %url);
        let request = self
            .http()
            .put(&url)
            .header("apikey", self.anon_key())
            .bearer_auth(access_token)
            .json(update);
        self.execute(request, span).await
    }

    /// Re-send the signup confirmation email.
    pub async fn resend_confirmation(&self, email: &str) -> Result<(), PlatformError> {
        let url = self.endpoint("/auth/v1/resend");
        let redirect = format!("{}/auth/verify-email", self.config().site_url());
        let span = info_span!("platform.resend_confirmation", http.method = "POST", url = %url);
        let request = self
            .http()
            .post(&url)
            .header("apikey", self.anon_key())
            .query(&[("redirect_to", redirect.as_str())])
            .json(&json!({ "type": "signup", "email": email }));
        self.execute_empty(request, span).await
    }

    /// Send the password-recovery email.
    pub async fn reset_password_for_email(&self, email: &str) -> Result<(), PlatformError> {
        let url = self.endpoint("/auth/v1/recover");
        let redirect = format!("{}/auth/reset-password", self.config().site_url());
        let span = info_span!("platform.reset_password_for_email", http.method = "POST", url = %url);
        let request = self
            .http()
            .post(&url)
            .header("apikey", self.anon_key())
            .query(&[("redirect_to", redirect.as_str())])
            .json(&json!({ "email": email }));
        self.execute_empty(request, span).await
    }

    /// Remove the user record entirely. Requires the server-only key.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), PlatformError> {
        let url = self.endpoint(&format!("/auth/v1/admin/users/{user_id}"));
        let span = info_span!("platform.delete_user", http.method = "DELETE", url = %url);
        let request = self
            .http()
            .delete(&url)
            .header("apikey", self.service_role_key())
            .bearer_auth(self.service_role_key());
        self.execute_empty(request, span).await
    }
}
