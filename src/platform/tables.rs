//! Table reads/writes against the platform's relational store.
//!
//! The schema (`subscriptions`, `plans`) is a fixed external contract owned by
//! the platform; this module only projects rows in and out of it. Reads run
//! with the caller's access token so the platform's row-level rules apply;
//! writes use the server-only key.

use reqwest::header::ACCEPT;
use tracing::info_span;
use uuid::Uuid;

use super::types::{NewSubscription, Plan, Subscription, SubscriptionPatch};
use super::{Platform, PlatformError};

/// PostgREST media type for "exactly one row"; zero rows become a rejection
/// that [`PlatformError::is_not_found`] recognizes.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

impl Platform {
    /// Look up the caller's subscription row, `None` when there is none.
    pub async fn subscription_for_user(
        &self,
        access_token: &str,
        user_id: Uuid,
    ) -> Result<Option<Subscription>, PlatformError> {
        let url = self.endpoint("/rest/v1/subscriptions");
        let filter = format!("eq.{user_id}");
        let span = info_span!("platform.subscription_select", http.method = "GET", url = %url);
        let request = self
            .http()
            .get(&url)
            .header("apikey", self.anon_key())
            .bearer_auth(access_token)
            .header(ACCEPT, SINGLE_OBJECT)
            .query(&[("user_id", filter.as_str()), ("select", "*")]);

        match self.execute::<Subscription>(request, span).await {
            Ok(subscription) => Ok(Some(subscription)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Create or replace the caller's subscription row, keyed on `user_id`.
    pub async fn upsert_subscription(
        &self,
        row: &NewSubscription,
    ) -> Result<Subscription, PlatformError> {
        let url = self.endpoint("/rest/v1/subscriptions");
        let span = info_span!("platform.subscription_upsert", http.method = "POST", url = %url);
        let request = self
            .http()
            .post(&url)
            .header("apikey", self.service_role_key())
            .bearer_auth(self.service_role_key())
            .header(ACCEPT, SINGLE_OBJECT)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .query(&[("on_conflict", "user_id")])
            .json(row);
        self.execute(request, span).await
    }

    /// Partially update the caller's subscription row.
    pub async fn update_subscription(
        &self,
        user_id: Uuid,
        patch: &SubscriptionPatch,
    ) -> Result<Subscription, PlatformError> {
        let url = self.endpoint("/rest/v1/subscriptions");
        let filter = format!("eq.{user_id}");
        let span = info_span!("platform.subscription_update", http.method = "PATCH", url = %url);
        let request = self
            .http()
            .patch(&url)
            .header("apikey", self.service_role_key())
            .bearer_auth(self.service_role_key())
            .header(ACCEPT, SINGLE_OBJECT)
            .header("Prefer", "return=representation")
            .query(&[("user_id", filter.as_str())])
            .json(patch);
        self.execute(request, span).await
    }

    /// Public pricing data, cheapest plan first.
    pub async fn list_plans(&self) -> Result<Vec<Plan>, PlatformError> {
        let url = self.endpoint("/rest/v1/plans");
        let span = info_span!("platform.plans_select", http.method = "GET", url = %url);
        let request = self
            .http()
            .get(&url)
            .header("apikey", self.anon_key())
            .bearer_auth(self.anon_key())
            .query(&[("select", "*"), ("order", "price_monthly.asc")]);
        self.execute(request, span).await
    }
}
