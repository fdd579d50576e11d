//! Connection configuration and endpoint resolution.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default base delay before the first reconnection attempt.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(3000);

/// Default ceiling the reconnection delay is clamped to.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Host used when [`Mode::Dev`] resolves an endpoint without overrides.
pub const DEV_HOST: &str = "127.0.0.1";

/// Signaling port served by local development servers.
pub const DEV_PORT: u16 = 3034;

/// Canonical production signaling host.
pub const PRODUCTION_HOST: &str = "signal.mooring-stream.dev";

/// Standard secure port of the production signaling service.
pub const PRODUCTION_PORT: u16 = 443;

/// Mount point the signaling service is served under.
pub const SIGNALING_PATH: &str = "/stream";

/// Deployment mode selecting default endpoint resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Local development: loopback host and the fixed development port.
    Dev,
    /// Production: canonical remote host on the standard secure port.
    Production,
}

/// Resolved signaling endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Host name or address of the signaling server.
    pub host: String,
    /// TCP port of the signaling server.
    pub port: u16,
    /// Whether the connection is made over TLS.
    pub secure: bool,
    /// Path the signaling service is mounted under.
    pub path: String,
}

/// Reconnection delay policy.
///
/// The k-th scheduled reconnect (counting from zero since the last successful
/// open) waits `min(base_delay * 2^k, max_delay)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first reconnection attempt.
    pub base_delay: Duration,
    /// Ceiling the exponential growth is clamped to.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with explicit delays.
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
        }
    }

    /// Delay for the reconnect scheduled after `attempt_count` consecutive
    /// failures.
    pub fn delay_for(&self, attempt_count: u32) -> Duration {
        // Past 2^16 the product exceeds any sane ceiling; clamping the
        // exponent keeps the shift in range.
        let exponent = attempt_count.min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// Configuration accepted by `Supervisor::start`.
///
/// Immutable for the lifetime of a running supervisor; a different
/// configuration may be supplied after `stop`.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Prefix every generated signaling identity starts with.
    pub identity_prefix: String,
    /// Deployment mode used for endpoint resolution.
    pub mode: Mode,
    /// Replaces the mode's default host when set.
    pub host_override: Option<String>,
    /// Replaces the mode's default port when set.
    pub port_override: Option<u16>,
    /// Emit diagnostic log lines. Observability only.
    pub verbose_logging: bool,
    /// Reconnection delay policy.
    pub retry: RetryPolicy,
}

impl ConnectionConfig {
    /// Create a configuration with defaults for the given prefix and mode.
    pub fn new(identity_prefix: impl Into<String>, mode: Mode) -> Self {
        Self {
            identity_prefix: identity_prefix.into(),
            mode,
            host_override: None,
            port_override: None,
            verbose_logging: false,
            retry: RetryPolicy::default(),
        }
    }

    /// Resolve the signaling endpoint from mode defaults and overrides.
    pub fn endpoint(&self) -> Endpoint {
        let (default_host, default_port) = match self.mode {
            Mode::Dev => (DEV_HOST, DEV_PORT),
            Mode::Production => (PRODUCTION_HOST, PRODUCTION_PORT),
        };
        Endpoint {
            host: self
                .host_override
                .clone()
                .unwrap_or_else(|| default_host.to_string()),
            port: self.port_override.unwrap_or(default_port),
            secure: true,
            path: SIGNALING_PATH.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_mode_resolves_loopback() {
        let config = ConnectionConfig::new("cam", Mode::Dev);
        let endpoint = config.endpoint();

        assert_eq!(endpoint.host, DEV_HOST);
        assert_eq!(endpoint.port, DEV_PORT);
        assert_eq!(endpoint.path, SIGNALING_PATH);
    }

    #[test]
    fn production_mode_resolves_canonical_host() {
        let config = ConnectionConfig::new("cam", Mode::Production);
        let endpoint = config.endpoint();

        assert_eq!(endpoint.host, PRODUCTION_HOST);
        assert_eq!(endpoint.port, PRODUCTION_PORT);
        assert!(endpoint.secure);
    }

    #[test]
    fn overrides_replace_individual_fields() {
        let mut config = ConnectionConfig::new("cam", Mode::Production);
        config.host_override = Some("staging.example.net".to_string());
        let endpoint = config.endpoint();
        assert_eq!(endpoint.host, "staging.example.net");
        assert_eq!(endpoint.port, PRODUCTION_PORT);

        config.port_override = Some(8443);
        assert_eq!(config.endpoint().port, 8443);
    }

    #[test]
    fn delay_doubles_until_the_ceiling() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for(0), Duration::from_millis(3000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(6000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(12000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(24000));
        assert_eq!(policy.delay_for(4), Duration::from_secs(30));
        assert_eq!(policy.delay_for(5), Duration::from_secs(30));
    }

    #[test]
    fn delay_is_clamped_for_huge_failure_counts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(u32::MAX), policy.max_delay);
    }

    #[test]
    fn custom_policy_respects_its_own_ceiling() {
        let policy = RetryPolicy::new(Duration::from_secs(1), Duration::from_secs(4));

        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }
}
