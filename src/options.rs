use std::time::Duration;

/// Versioned production endpoint used when no base URL is supplied.
pub const DEFAULT_BASE_URL: &str = "https://api.sensorlink.io/v1";
/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Exponential backoff policy for retryable failures.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound for any single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Growth factor applied per retry.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry `attempt` (1-based):
    /// `min(initial_delay_ms * backoff_multiplier^(attempt - 1), max_delay_ms)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let raw = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exp);
        let capped = raw.min(self.max_delay_ms as f64);
        // NaN and negative values collapse to zero; inf is already capped.
        let millis = if capped.is_finite() && capped > 0.0 {
            capped as u64
        } else {
            0
        };
        Duration::from_millis(millis)
    }
}

/// Configures base URL, timeout and retry behavior.
///
/// Override individual fields with struct-update syntax:
///
/// ```
/// use sensorlink_http::ClientOptions;
///
/// let opts = ClientOptions {
///     timeout_ms: 5_000,
///     ..ClientOptions::default()
/// };
/// assert_eq!(opts.retry.max_retries, 3);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ClientOptions {
    /// API root; a trailing `/` is added if missing.
    pub base_url: String,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Retry policy.
    pub retry: RetryPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry: RetryPolicy::default(),
        }
    }
}
