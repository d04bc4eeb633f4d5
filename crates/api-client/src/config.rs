//! Configuration for the connector HTTP client
//!
//! Built from the connector settings; the builder methods exist for tests and
//! one-off commands that need a different policy.

use crate::error::{ApiError, ApiResult};
use ofeed_core::config::Settings;
use ofeed_core::retry::RetryConfig;
use std::time::Duration;

/// User agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("ofeed-connector/", env!("CARGO_PKG_VERSION"));

/// Client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// `User-Agent` header value
    pub user_agent: String,
    /// Timeout for establishing a connection, `None` for no limit
    pub connect_timeout: Option<Duration>,
    /// Timeout between reads of a response, `None` for no limit
    pub read_timeout: Option<Duration>,
    /// Timeout for a complete call, `None` for no limit
    pub call_timeout: Option<Duration>,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl ClientConfig {
    /// Create configuration from connector settings
    ///
    /// A cycle is repeated at the next upload tick, so no retries are configured.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: settings.http.connect_timeout(),
            read_timeout: settings.http.read_timeout(),
            call_timeout: settings.http.call_timeout(),
            retry: RetryConfig::no_retry(),
        }
    }

    /// Builder-style method to set the user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Builder-style method to set all timeouts at once
    #[must_use]
    pub fn with_timeouts(
        mut self,
        connect: Option<Duration>,
        read: Option<Duration>,
        call: Option<Duration>,
    ) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self.call_timeout = call;
        self
    }

    /// Builder-style method to set retry config
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Fails on an empty user agent or zero retry attempts.
    pub fn validate(&self) -> ApiResult<()> {
        if self.user_agent.trim().is_empty() {
            return Err(ApiError::config("user_agent cannot be empty"));
        }

        if self.retry.max_attempts == 0 {
            return Err(ApiError::config("retry.max_attempts must be at least 1"));
        }

        let zero = [self.connect_timeout, self.read_timeout, self.call_timeout]
            .into_iter()
            .flatten()
            .any(|t| t.is_zero());
        if zero {
            return Err(ApiError::config("use None instead of a zero timeout"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(config.user_agent.starts_with("ofeed-connector/"));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.read_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.call_timeout, None);
        assert_eq!(config.retry.max_attempts, 1);
    }

    #[test]
    fn test_from_settings_disables_zero_timeouts() {
        let mut settings = Settings::default();
        settings.http.connect_timeout_secs = 0;
        settings.http.call_timeout_secs = 60;

        let config = ClientConfig::from_settings(&settings);
        assert_eq!(config.connect_timeout, None);
        assert_eq!(config.call_timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_builder_pattern() {
        let config = ClientConfig::default()
            .with_user_agent("test-agent")
            .with_retry(RetryConfig::with_attempts(3));

        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_validation() {
        assert!(ClientConfig::default().validate().is_ok());

        let invalid = ClientConfig::default().with_user_agent("  ");
        assert!(invalid.validate().is_err());

        let zero = ClientConfig::default().with_timeouts(Some(Duration::ZERO), None, None);
        assert!(zero.validate().is_err());
    }
}
