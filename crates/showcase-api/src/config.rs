//! Configuration management for the Showcase API
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use showcase_common::DEFAULT_MAX_CONTENT_LENGTH;
use std::env;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub api_host: String,

    /// API server port
    pub api_port: u16,

    /// How long the sleep endpoints wait, in milliseconds
    pub sleep_ms: u64,

    /// Largest body accepted by `/size`, in bytes
    pub max_content_length: u64,

    /// Where a submitted survey is redirected to
    pub survey_redirect: String,

    /// Home path reported by `/info`
    pub home_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
            sleep_ms: 1000,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            survey_redirect: "/static/thanks.html".to_string(),
            home_path: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let config = Config {
            api_host: env::var("API_HOST").unwrap_or(defaults.api_host),

            api_port: match env::var("API_PORT") {
                Ok(port) => port.parse().context("Invalid API_PORT")?,
                Err(_) => defaults.api_port,
            },

            sleep_ms: match env::var("SLEEP_MS") {
                Ok(ms) => ms.parse().context("Invalid SLEEP_MS")?,
                Err(_) => defaults.sleep_ms,
            },

            max_content_length: match env::var("MAX_CONTENT_LENGTH") {
                Ok(len) => len.parse().context("Invalid MAX_CONTENT_LENGTH")?,
                Err(_) => defaults.max_content_length,
            },

            survey_redirect: env::var("SURVEY_REDIRECT").unwrap_or(defaults.survey_redirect),

            home_path: env::var("HOMEPATH").ok(),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.api_port == 0 {
            anyhow::bail!("API_PORT must be greater than 0");
        }

        if self.max_content_length == 0 {
            anyhow::bail!("MAX_CONTENT_LENGTH must be greater than 0");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    pub fn sleep_duration(&self) -> Duration {
        Duration::from_millis(self.sleep_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();

        assert_eq!(config.api_host, "0.0.0.0");
        assert_eq!(config.api_port, 8000);
        assert_eq!(config.sleep_duration(), Duration::from_secs(1));
        assert_eq!(config.max_content_length, 5 * 1024 * 1024);
        assert_eq!(config.survey_redirect, "/static/thanks.html");
        assert!(config.home_path.is_none());
    }

    #[test]
    fn test_api_address() {
        let config = Config {
            api_host: "127.0.0.1".to_string(),
            api_port: 9000,
            ..Config::default()
        };

        assert_eq!(config.api_address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_validate_invalid_port() {
        let config = Config {
            api_port: 0,
            ..Config::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("API_PORT must be greater than 0"));
    }

    #[test]
    fn test_validate_zero_content_length() {
        let config = Config {
            max_content_length: 0,
            ..Config::default()
        };

        assert!(config.validate().is_err());
    }
}
