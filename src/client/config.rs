/*!
 * Client Configuration
 * Backend addresses, cache defaults and environment loading
 */

use crate::core::limits::{
    DEFAULT_API_BASE_URL, DEFAULT_CACHE_TTL_MINUTES, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use miette::Diagnostic;
use reqwest::Url;
use std::time::Duration;
use thiserror::Error;

use super::options::ttl_from_minutes;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {var}: {reason}")]
    #[diagnostic(code(config::invalid_value))]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
}

/// Environment variables read by [`ClientConfig::from_env`]
pub mod env {
    pub const API_BASE_URL: &str = "LMS_API_BASE_URL";
    pub const SECONDARY_API_BASE_URL: &str = "LMS_SECONDARY_API_BASE_URL";
    pub const CACHE_TTL_MINUTES: &str = "LMS_CACHE_TTL_MINUTES";
    pub const REQUEST_TIMEOUT_SECS: &str = "LMS_REQUEST_TIMEOUT_SECS";
    pub const API_TOKEN: &str = "LMS_API_TOKEN";
    pub const INVALIDATE_ON_WRITE: &str = "LMS_INVALIDATE_ON_WRITE";
}

/// Cached client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Main LMS API
    pub base_url: String,
    /// Lectures/transport API; the main API when unset
    pub secondary_base_url: Option<String>,
    /// TTL for GETs that do not set one
    pub default_ttl: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub bearer_token: Option<String>,
    /// Drop cached entries under a written resource after POST/PATCH/DELETE
    pub invalidate_on_write: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            secondary_base_url: None,
            default_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_MINUTES * 60),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: concat!("lms-core/", env!("CARGO_PKG_VERSION")).to_string(),
            bearer_token: None,
            invalidate_on_write: false,
        }
    }
}

fn invalid(var: &str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        var: var.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(invalid(var, value, "expected a boolean")),
    }
}

fn check_base_url(var: &str, url: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(url).map_err(|e| invalid(var, url, e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(var, url, format!("unsupported scheme '{}'", other))),
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load from the process environment, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(env::API_BASE_URL) {
            config.base_url = url;
        }
        config.secondary_base_url = lookup(env::SECONDARY_API_BASE_URL).filter(|u| !u.is_empty());
        config.bearer_token = lookup(env::API_TOKEN).filter(|t| !t.is_empty());

        if let Some(raw) = lookup(env::CACHE_TTL_MINUTES) {
            let minutes: f64 = raw
                .trim()
                .parse()
                .map_err(|_| invalid(env::CACHE_TTL_MINUTES, &raw, "expected a number of minutes"))?;
            config.default_ttl = ttl_from_minutes(minutes);
        }

        if let Some(raw) = lookup(env::REQUEST_TIMEOUT_SECS) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| invalid(env::REQUEST_TIMEOUT_SECS, &raw, "expected whole seconds"))?;
            if secs == 0 {
                return Err(invalid(env::REQUEST_TIMEOUT_SECS, &raw, "must be positive"));
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup(env::INVALIDATE_ON_WRITE) {
            config.invalidate_on_write = parse_bool(env::INVALIDATE_ON_WRITE, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject unusable base URLs and a zero timeout
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_base_url(env::API_BASE_URL, &self.base_url)?;
        if let Some(url) = &self.secondary_base_url {
            check_base_url(env::SECONDARY_API_BASE_URL, url)?;
        }
        if self.request_timeout.is_zero() {
            return Err(invalid(
                env::REQUEST_TIMEOUT_SECS,
                "0",
                "must be positive",
            ));
        }
        Ok(())
    }

    pub fn with_secondary_base_url(mut self, url: impl Into<String>) -> Self {
        self.secondary_base_url = Some(url.into());
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_invalidate_on_write(mut self, enabled: bool) -> Self {
        self.invalidate_on_write = enabled;
        self
    }

    /// Same settings pointed at the secondary API
    pub fn secondary(&self) -> Self {
        Self {
            base_url: self
                .secondary_base_url
                .clone()
                .unwrap_or_else(|| self.base_url.clone()),
            ..self.clone()
        }
    }
}
