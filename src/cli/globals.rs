use anyhow::{anyhow, Result};
use secrecy::SecretString;

/// Settings shared by every action, resolved from CLI args and environment.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub platform_url: String,
    pub site_url: String,
    pub anon_key: SecretString,
    pub service_role_key: SecretString,
    pub platform_deadline_seconds: u64,
    pub resend_cooldown_seconds: u64,
}

impl GlobalArgs {
    /// # Errors
    /// Returns an error if a required argument is missing from the matches.
    pub fn from_matches(matches: &clap::ArgMatches) -> Result<Self> {
        let string_arg = |name: &str| -> Result<String> {
            matches
                .get_one::<String>(name)
                .map(String::to_string)
                .ok_or_else(|| anyhow!("missing required argument: --{name}"))
        };

        Ok(Self {
            platform_url: string_arg("platform-url")?,
            site_url: string_arg("site-url")?,
            anon_key: SecretString::from(string_arg("anon-key")?),
            service_role_key: SecretString::from(string_arg("service-role-key")?),
            platform_deadline_seconds: matches
                .get_one::<u64>("platform-deadline")
                .copied()
                .unwrap_or(10),
            resend_cooldown_seconds: matches
                .get_one::<u64>("resend-cooldown")
                .copied()
                .unwrap_or(60),
        })
    }
}
