//! Retry policy with exponential backoff and jitter.
//!
//! The request engine retries transient failures up to a bounded attempt
//! count. Permanent errors short-circuit the loop immediately. An optional
//! observer callback is told about every failure that will be retried, which
//! lets callers log or report without altering control flow.

use std::sync::Arc;
use std::time::Duration;

/// Configuration for retry behavior with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first (default: 5).
    pub max_attempts: u32,
    /// Initial backoff delay in milliseconds (default: 250).
    pub initial_backoff_ms: u64,
    /// Maximum backoff delay cap in milliseconds (default: 30000).
    pub max_backoff_ms: u64,
    /// Backoff multiplier between attempts (default: 2.0).
    pub backoff_multiplier: f64,
    /// Whether to add jitter to backoff delays (default: true).
    pub use_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 250,
            max_backoff_ms: 30_000,
            backoff_multiplier: 2.0,
            use_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a retry config with a custom attempt count.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Disable retries entirely (a single attempt is still made).
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Config with near-zero delays, for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 10,
            backoff_multiplier: 2.0,
            use_jitter: false,
        }
    }

    /// Set the initial backoff delay.
    #[must_use]
    pub fn with_initial_backoff(mut self, ms: u64) -> Self {
        self.initial_backoff_ms = ms;
        self
    }

    /// Set the maximum backoff delay.
    #[must_use]
    pub fn with_max_backoff(mut self, ms: u64) -> Self {
        self.max_backoff_ms = ms;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be > 0".to_string());
        }
        if self.max_backoff_ms < self.initial_backoff_ms {
            return Err("max_backoff_ms must be >= initial_backoff_ms".to_string());
        }
        if self.backoff_multiplier < 1.0 {
            return Err("backoff_multiplier must be >= 1.0".to_string());
        }
        Ok(())
    }

    /// Backoff delay before the retry following the given attempt (1-based).
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff_ms as f64
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let capped = base.min(self.max_backoff_ms as f64);

        let delay_ms = if self.use_jitter {
            use rand::Rng;
            // Up to 25% additive jitter to spread out synchronized retries
            let jitter = rand::thread_rng().gen_range(0.0..=capped * 0.25);
            capped + jitter
        } else {
            capped
        };

        Duration::from_millis(delay_ms as u64)
    }
}

/// Details handed to the retry observer for each retryable failure.
#[derive(Debug, Clone)]
pub struct RetryEvent {
    /// Full URL of the failing request.
    pub url: String,
    /// Classification code of the error (see `TfcError::error_code`).
    pub error_code: &'static str,
    /// Human-readable rendering of the error.
    pub error: String,
    /// 1-based attempt number that just failed.
    pub attempt: u32,
    /// Attempts remaining after this failure.
    pub attempts_remaining: u32,
}

/// Shared observer invoked once per failure that will be retried.
pub type RetryObserver = Arc<dyn Fn(&RetryEvent) + Send + Sync>;
