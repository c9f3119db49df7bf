//! Client configuration.

use crate::error::{ClientResult, PreconditionError};
use std::time::Duration;

/// Configuration for the client.
///
/// `api_url` is the only required field; the rest have defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base address of the backend API (e.g., "http://127.0.0.1:5001").
    pub api_url: String,
    /// Per-request timeout applied by the HTTP transport.
    pub timeout: Duration,
    /// User agent sent by the HTTP transport.
    pub user_agent: String,
}

impl ClientConfig {
    /// Creates a configuration for the given base address.
    pub fn new(api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim().trim_end_matches('/').to_string();
        Self {
            api_url,
            timeout: Duration::from_secs(10),
            user_agent: concat!("wukongim-rs/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the base address without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.api_url
    }

    /// Checks that the configuration is usable.
    pub fn validate(&self) -> ClientResult<()> {
        if self.api_url.is_empty() {
            return Err(PreconditionError::NotConfigured.into());
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(PreconditionError::InvalidConfig(format!(
                "api_url {:?} must start with http:// or https://",
                self.api_url
            ))
            .into());
        }
        if self.timeout.is_zero() {
            return Err(PreconditionError::InvalidConfig("timeout must be non-zero".into()).into());
        }
        Ok(())
    }
}
