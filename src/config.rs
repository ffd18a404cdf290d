//! Client and retry configuration.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Largest accepted delay between attempts, in milliseconds.
pub const MAX_RETRY_DELAY_MS: i64 = 60_000;

/// Delay between attempts when none is configured, in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: i64 = 1_000;

/// Total attempts per logical call: one initial send plus two retries.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Transport configuration passed through to the underlying HTTP client.
///
/// The retry layer does not interpret these values; they only shape how the
/// default [`ReqwestTransport`](crate::transport::ReqwestTransport) is built.
///
/// # Examples
///
/// ```
/// use reattempt::ClientConfig;
///
/// let config = ClientConfig::from_json(r#"{
///     "base_url": "https://api.example.com",
///     "headers": { "user-agent": "my-app/1.0" },
///     "timeout_ms": 5000
/// }"#).unwrap();
///
/// assert_eq!(config.timeout_ms, Some(5000));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL that relative request URLs are resolved against.
    pub base_url: Option<String>,
    /// Headers sent with every request.
    pub headers: BTreeMap<String, String>,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl ClientConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the JSON does not match.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json)
            .map_err(|e| Error::ConfigurationError(format!("Invalid client config: {}", e)))
    }
}

/// How long to wait between attempts and how many attempts to make.
///
/// The delay is fixed; there is no backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOptions {
    delay: Duration,
    max_attempts: u32,
}

impl RetryOptions {
    /// Validates a delay given in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] unless `0 <= millis <= 60000`.
    ///
    /// # Examples
    ///
    /// ```
    /// use reattempt::RetryOptions;
    ///
    /// assert!(RetryOptions::from_millis(250).is_ok());
    /// assert!(RetryOptions::from_millis(-50).is_err());
    /// assert!(RetryOptions::from_millis(60_001).is_err());
    /// ```
    pub fn from_millis(millis: i64) -> Result<Self, Error> {
        if !(0..=MAX_RETRY_DELAY_MS).contains(&millis) {
            return Err(Error::ConfigurationError(format!(
                "Retry time must be between 0 and {} ms, got {}",
                MAX_RETRY_DELAY_MS, millis
            )));
        }
        Ok(Self {
            delay: Duration::from_millis(millis as u64),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    /// Overrides the attempt bound.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if `max_attempts` is zero.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Result<Self, Error> {
        if max_attempts == 0 {
            return Err(Error::ConfigurationError(
                "Max attempts must be at least 1".to_string(),
            ));
        }
        self.max_attempts = max_attempts;
        Ok(self)
    }

    /// The delay before each retry.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Total attempts per logical call, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS as u64),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}
