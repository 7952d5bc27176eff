//! Client configuration for the reconciler and its transport.

use std::fmt;
use std::time::Duration;

/// Configuration for talking to the sandbox control plane.
///
/// Constructed once at the reconciliation boundary and passed by value;
/// nothing mutates it mid-flow.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the control plane, e.g. `https://sandboxes.internal:8443`.
    pub endpoint: String,
    /// Bearer token for the control plane.
    pub token: String,
    /// Timeout for a single HTTP request (default: 30s).
    pub request_timeout: Duration,
    /// Wait for accepted operations to reach a terminal phase (default: true).
    ///
    /// When disabled, an accepted change is observed exactly once and
    /// reported with whatever phase the operation is in at that moment.
    pub wait_for_completion: bool,
    /// Total time to wait for an accepted operation (default: 300s).
    pub wait_timeout: Duration,
    /// Interval between operation polls (default: 2s).
    pub poll_interval: Duration,
}

// The token must never reach the logs, so Debug is written by hand.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("wait_for_completion", &self.wait_for_completion)
            .field("wait_timeout", &self.wait_timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

/// Configuration validation error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("api_endpoint is required")]
    MissingEndpoint,

    #[error("api_token is required")]
    MissingToken,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            token: String::new(),
            request_timeout: Duration::from_secs(30),
            wait_for_completion: true,
            wait_timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(2),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Load endpoint and token from environment variables.
    ///
    /// | Variable | Purpose |
    /// |----------|---------|
    /// | `SANDPIPER_API_ENDPOINT` | control plane base URL |
    /// | `SANDPIPER_API_TOKEN` | bearer token |
    ///
    /// Everything else keeps its default. Host-supplied parameters take
    /// precedence over these at the boundary.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(endpoint) = std::env::var("SANDPIPER_API_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Ok(token) = std::env::var("SANDPIPER_API_TOKEN") {
            config.token = token;
        }
        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }
        if self.token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("request_timeout"));
        }
        if self.wait_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("wait_timeout"));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("poll_interval"));
        }
        Ok(())
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the control plane base URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Set the bearer token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = token.into();
        self
    }

    /// Set the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Choose whether accepted operations are polled to a terminal phase.
    pub fn wait_for_completion(mut self, wait: bool) -> Self {
        self.config.wait_for_completion = wait;
        self
    }

    /// Set the total wait budget for an accepted operation.
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.config.wait_timeout = timeout;
        self
    }

    /// Set the interval between operation polls.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Build the configuration, validating required fields.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.wait_for_completion);
        assert_eq!(config.wait_timeout, Duration::from_secs(300));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_builder_requires_endpoint_and_token() {
        assert!(matches!(
            ClientConfig::builder().token("t").build(),
            Err(ConfigError::MissingEndpoint)
        ));
        assert!(matches!(
            ClientConfig::builder().endpoint("https://cp").build(),
            Err(ConfigError::MissingToken)
        ));
    }

    #[test]
    fn test_builder_rejects_zero_durations() {
        let result = ClientConfig::builder()
            .endpoint("https://cp")
            .token("t")
            .poll_interval(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(ConfigError::ZeroDuration("poll_interval"))));
    }

    #[test]
    fn test_builder_success() {
        let config = ClientConfig::builder()
            .endpoint("https://sandboxes.internal:8443")
            .token("secret")
            .request_timeout(Duration::from_secs(10))
            .wait_for_completion(false)
            .build()
            .expect("should build");
        assert_eq!(config.endpoint, "https://sandboxes.internal:8443");
        assert!(!config.wait_for_completion);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ClientConfig::builder()
            .endpoint("https://cp")
            .token("super-secret")
            .build()
            .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
