//! Configuration Module
//!
//! Gateway settings read from the environment by the hosting binary.

use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::api::{DEFAULT_API_BASE, DEFAULT_AUTH_BASE};
use crate::auth::Credentials;
use crate::dispatch::WakeConfig;

/// Which auth strategy the account uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    RefreshToken,
    OwnerLogin,
}

impl AuthMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "refresh_token" => Some(Self::RefreshToken),
            "owner_login" => Some(Self::OwnerLogin),
            _ => None,
        }
    }
}

/// Settings for the gateway binary.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub credentials: Credentials,
    pub api_base: String,
    pub auth_base: String,
    pub wake: WakeConfig,
}

impl GatewayConfig {
    /// Build a config from `TESLA_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mode = match std::env::var("TESLA_AUTH_MODE") {
            Ok(value) => AuthMode::parse(&value)
                .with_context(|| format!("unsupported TESLA_AUTH_MODE: {value}"))?,
            Err(_) => AuthMode::RefreshToken,
        };

        let email = std::env::var("TESLA_EMAIL").context("TESLA_EMAIL is not set")?;

        let credentials = match mode {
            AuthMode::RefreshToken => {
                let refresh_token = std::env::var("TESLA_REFRESH_TOKEN")
                    .context("TESLA_REFRESH_TOKEN is not set")?;
                Credentials::RefreshToken {
                    email,
                    refresh_token,
                }
            }
            AuthMode::OwnerLogin => {
                let password =
                    std::env::var("TESLA_PASSWORD").context("TESLA_PASSWORD is not set")?;
                Credentials::OwnerLogin { email, password }
            }
        };

        let mut wake = WakeConfig::default();
        if let Ok(value) = std::env::var("TESLA_WAKE_ATTEMPTS") {
            wake.max_attempts = value.parse().context("TESLA_WAKE_ATTEMPTS is not a number")?;
            if wake.max_attempts == 0 {
                bail!("TESLA_WAKE_ATTEMPTS must be at least 1");
            }
        }
        if let Ok(value) = std::env::var("TESLA_WAKE_INTERVAL_SECS") {
            let secs: u64 = value
                .parse()
                .context("TESLA_WAKE_INTERVAL_SECS is not a number")?;
            wake.poll_interval = Duration::from_secs(secs);
        }

        Ok(Self {
            credentials,
            api_base: std::env::var("TESLA_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            auth_base: std::env::var("TESLA_AUTH_BASE")
                .unwrap_or_else(|_| DEFAULT_AUTH_BASE.to_string()),
            wake,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_mode_parsing() {
        assert_eq!(AuthMode::parse("refresh_token"), Some(AuthMode::RefreshToken));
        assert_eq!(AuthMode::parse("owner_login"), Some(AuthMode::OwnerLogin));
        assert_eq!(AuthMode::parse("oauth"), None);
    }
}
