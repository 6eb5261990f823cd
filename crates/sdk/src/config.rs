//! Configuration types for the Bugzilla SDK.

use std::fmt;
use std::time::Duration;
use url::Url;

/// Configuration for the Bugzilla client.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the Bugzilla server, without the `/rest` suffix.
    pub base_url: Url,
    /// API key sent with every request.
    pub api_key: Option<String>,
    /// How the API key is attached to outbound requests.
    pub auth_scheme: AuthScheme,
    /// Timeout for a single attempt.
    pub timeout: Duration,
    /// Retry policy applied to every call.
    pub retry_policy: RetryPolicy,
}

impl ClientConfig {
    /// Create a new configuration with the given base URL.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_key: None,
            auth_scheme: AuthScheme::default(),
            timeout: Duration::from_secs(30),
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("auth_scheme", &self.auth_scheme)
            .field("timeout", &self.timeout)
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

/// How the API key travels to Bugzilla.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthScheme {
    /// `X-BUGZILLA-API-KEY: <key>`
    #[default]
    ApiKeyHeader,
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `?api_key=<key>` (older installations only)
    QueryParam,
}

impl AuthScheme {
    /// Stable name used in configuration output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiKeyHeader => "api-key-header",
            Self::Bearer => "bearer",
            Self::QueryParam => "query",
        }
    }
}

/// Whether repeating a call can change tracker state twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idempotency {
    /// Reads. Safe to repeat.
    Safe,
    /// Writes such as posting a comment.
    Unsafe,
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included.
    pub max_attempts: u32,
    /// Backoff before the second attempt.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub backoff_multiplier: f64,
    /// HTTP status codes to retry on.
    pub retry_on_status_codes: Vec<u16>,
    /// Retry writes on timeouts and retryable statuses too.
    ///
    /// Off by default: a write that timed out may already have been applied,
    /// and repeating it would post a duplicate comment. Connection failures
    /// are always retried because the request never left the process.
    pub retry_non_idempotent: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            retry_on_status_codes: vec![500, 502, 503, 504],
            retry_non_idempotent: false,
        }
    }
}

impl RetryPolicy {
    /// Create a policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Backoff to wait after the given (1-based) failed attempt.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let backoff_ms =
            self.initial_backoff.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let backoff = Duration::from_millis(backoff_ms as u64);
        std::cmp::min(backoff, self.max_backoff)
    }

    /// Check if a status code should trigger a retry.
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status_codes.contains(&status)
    }

    /// Whether another attempt is allowed after `attempt` attempts.
    pub fn has_attempts_left(&self, attempt: u32) -> bool {
        attempt < self.max_attempts.max(1)
    }

    /// Decide whether a failed status response is worth another attempt.
    pub fn retry_status(&self, status: u16, idempotency: Idempotency) -> bool {
        self.should_retry_status(status) && self.allows(idempotency)
    }

    /// Decide whether a transport failure is worth another attempt.
    ///
    /// `connect` marks failures where no bytes reached the tracker.
    /// `in_flight` marks failures after the request may have reached it:
    /// timeouts, resets, connections closed before or during the response.
    pub fn retry_transport(&self, connect: bool, in_flight: bool, idempotency: Idempotency) -> bool {
        if connect {
            return true;
        }
        in_flight && self.allows(idempotency)
    }

    fn allows(&self, idempotency: Idempotency) -> bool {
        idempotency == Idempotency::Safe || self.retry_non_idempotent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.backoff_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_for_attempt(2), Duration::from_millis(400));
        assert_eq!(policy.backoff_for_attempt(3), Duration::from_millis(800));
    }

    #[test]
    fn test_backoff_capped_at_max() {
        let policy = RetryPolicy {
            max_backoff: Duration::from_millis(500),
            ..Default::default()
        };

        assert_eq!(policy.backoff_for_attempt(10), Duration::from_millis(500));
    }

    #[test]
    fn test_should_retry_status() {
        let policy = RetryPolicy::default();

        assert!(policy.should_retry_status(500));
        assert!(policy.should_retry_status(503));
        assert!(!policy.should_retry_status(400));
        assert!(!policy.should_retry_status(401));
        assert!(!policy.should_retry_status(404));
        assert!(!policy.should_retry_status(429));
    }

    #[test]
    fn test_writes_not_retried_on_timeout_by_default() {
        let policy = RetryPolicy::default();

        assert!(policy.retry_transport(false, true, Idempotency::Safe));
        assert!(!policy.retry_transport(false, true, Idempotency::Unsafe));
        assert!(!policy.retry_status(503, Idempotency::Unsafe));
        // Nothing was sent, so repeating cannot duplicate the write.
        assert!(policy.retry_transport(true, false, Idempotency::Unsafe));
    }

    #[test]
    fn test_writes_retried_when_opted_in() {
        let policy = RetryPolicy {
            retry_non_idempotent: true,
            ..Default::default()
        };

        assert!(policy.retry_transport(false, true, Idempotency::Unsafe));
        assert!(policy.retry_status(502, Idempotency::Unsafe));
    }

    #[test]
    fn test_attempt_budget() {
        let policy = RetryPolicy::default();
        assert!(policy.has_attempts_left(1));
        assert!(policy.has_attempts_left(2));
        assert!(!policy.has_attempts_left(3));

        let single = RetryPolicy::no_retry();
        assert!(!single.has_attempts_left(1));

        // A zero budget still means one attempt.
        let zero = RetryPolicy {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(!zero.has_attempts_left(1));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let mut config = ClientConfig::new(Url::parse("https://bugzilla.example.com").unwrap());
        config.api_key = Some("super-secret".to_string());

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_client_config_defaults() {
        let url = Url::parse("https://bugzilla.example.com").unwrap();
        let config = ClientConfig::new(url.clone());

        assert_eq!(config.base_url, url);
        assert!(config.api_key.is_none());
        assert_eq!(config.auth_scheme, AuthScheme::ApiKeyHeader);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry_policy.max_attempts, 3);
        assert!(!config.retry_policy.retry_non_idempotent);
    }
}
