//! Brokerage API configuration.

use std::env;

use crate::errors::MarketDataError;

pub const REAL_BASE_URL: &str = "https://openapi.koreainvestment.com:9443";
pub const SANDBOX_BASE_URL: &str = "https://openapivts.koreainvestment.com:29443";

const ENV_APP_KEY: &str = "STOCKWATCH_APP_KEY";
const ENV_APP_SECRET: &str = "STOCKWATCH_APP_SECRET";
const ENV_IS_REAL: &str = "STOCKWATCH_IS_REAL";

/// Credentials and environment selection for the brokerage API.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub app_key: String,
    pub app_secret: String,
    /// `true` targets the production endpoint, `false` the paper-trading
    /// sandbox.
    pub is_real: bool,
}

impl BrokerConfig {
    pub fn new(app_key: impl Into<String>, app_secret: impl Into<String>, is_real: bool) -> Self {
        BrokerConfig {
            app_key: app_key.into(),
            app_secret: app_secret.into(),
            is_real,
        }
    }

    /// Loads the configuration from environment variables. The key and
    /// secret are required; the environment flag defaults to the sandbox.
    pub fn from_env() -> Result<Self, MarketDataError> {
        let app_key = require_env(ENV_APP_KEY)?;
        let app_secret = require_env(ENV_APP_SECRET)?;
        let is_real = env::var(ENV_IS_REAL)
            .map(|value| value.eq_ignore_ascii_case("true") || value == "1")
            .unwrap_or(false);
        Ok(BrokerConfig {
            app_key,
            app_secret,
            is_real,
        })
    }

    pub fn base_url(&self) -> &'static str {
        if self.is_real {
            REAL_BASE_URL
        } else {
            SANDBOX_BASE_URL
        }
    }
}

fn require_env(key: &str) -> Result<String, MarketDataError> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| MarketDataError::MissingConfig(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_follows_environment_flag() {
        let sandbox = BrokerConfig::new("key", "secret", false);
        assert_eq!(sandbox.base_url(), SANDBOX_BASE_URL);

        let real = BrokerConfig::new("key", "secret", true);
        assert_eq!(real.base_url(), REAL_BASE_URL);
    }

    // Environment manipulation lives in a single test so parallel test
    // execution cannot race on the process environment.
    #[test]
    fn from_env_requires_credentials() {
        std::env::remove_var(ENV_APP_KEY);
        std::env::remove_var(ENV_APP_SECRET);
        std::env::remove_var(ENV_IS_REAL);
        assert!(matches!(
            BrokerConfig::from_env(),
            Err(MarketDataError::MissingConfig(_))
        ));

        std::env::set_var(ENV_APP_KEY, "key");
        std::env::set_var(ENV_APP_SECRET, "secret");
        let config = BrokerConfig::from_env().unwrap();
        assert_eq!(config.app_key, "key");
        assert!(!config.is_real);

        std::env::set_var(ENV_IS_REAL, "true");
        let config = BrokerConfig::from_env().unwrap();
        assert!(config.is_real);

        std::env::remove_var(ENV_APP_KEY);
        std::env::remove_var(ENV_APP_SECRET);
        std::env::remove_var(ENV_IS_REAL);
    }
}
