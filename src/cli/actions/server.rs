use crate::api::{self, AppConfig, AppState};
use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::platform::{Platform, PlatformConfig};
use crate::studio::StudioStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::api::handlers::auth::CooldownStore;

/// Handle the server action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Server { port } => {
            // Fail fast on a bad platform URL before anything binds.
            Url::parse(&globals.platform_url)
                .with_context(|| format!("Invalid platform URL: {}", globals.platform_url))?;

            let platform_config = PlatformConfig::new(
                globals.platform_url.clone(),
                globals.anon_key.clone(),
                globals.service_role_key.clone(),
                globals.site_url.clone(),
            )
            .with_deadline_seconds(globals.platform_deadline_seconds);
            let platform = Platform::new(platform_config)?;

            let config = AppConfig::new(globals.site_url.clone())
                .with_resend_cooldown_seconds(globals.resend_cooldown_seconds);
            let limiter = Arc::new(CooldownStore::new(Duration::from_secs(
                globals.resend_cooldown_seconds,
            )));
            let state = AppState::new(config, limiter, StudioStore::new());

            api::new(port, platform, state).await?;
        }
    }

    Ok(())
}
