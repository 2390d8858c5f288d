//! Retry with exponential back-off for every outbound provider call.
//!
//! [`RetryPolicy::execute`] wraps any fallible async operation and retries on
//! transient errors (rate limits, network failures). Non-transient errors are
//! not retried. Either way a terminal failure comes back as
//! [`AnalyticsError::SourceFailed`] carrying the last error as its cause.

use std::future::Future;
use std::time::Duration;

use crate::error::AnalyticsError;

/// Longest single back-off sleep regardless of configuration.
const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - [`AnalyticsError::RateLimited`]: HTTP 429 or an explicit rate-limit error code.
/// - [`AnalyticsError::Http`] with a 429 status, or with no status at all
///   (timeout, connection refused/reset).
///
/// **Not retriable:** auth failures, other HTTP statuses, malformed bodies,
/// cache and narrative errors.
pub(crate) fn is_retriable(err: &AnalyticsError) -> bool {
    match err {
        AnalyticsError::RateLimited { .. } => true,
        AnalyticsError::Http(e) => match e.status() {
            Some(status) => status.as_u16() == 429,
            None => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
        },
        AnalyticsError::Unauthorized { .. }
        | AnalyticsError::UnexpectedStatus { .. }
        | AnalyticsError::Deserialize { .. }
        | AnalyticsError::Cache(_)
        | AnalyticsError::Narrative(_)
        | AnalyticsError::SourceFailed { .. }
        | AnalyticsError::Assembly(_) => false,
    }
}

/// Stateless retry combinator, safe to share across concurrent call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// `max_attempts` counts the first try; values below 1 are raised to 1.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            jitter: false,
        }
    }

    /// Scale every delay by a random factor in `[0.75, 1.25)`.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay slept after the `attempt`-th failure (1-based): `base * 2^(attempt-1)`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let computed = self.base_delay_ms.saturating_mul(1u64 << exponent);
        let capped = computed.min(MAX_DELAY_MS);
        if !self.jitter {
            return Duration::from_millis(capped);
        }
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
        Duration::from_millis(jittered)
    }

    /// Runs `operation` until it succeeds, fails with a non-retriable error,
    /// or `max_attempts` is reached.
    ///
    /// Back-off schedule with the defaults (3 attempts, 1 000 ms base):
    ///
    /// | Attempt | Sleep before next attempt |
    /// |---------|---------------------------|
    /// | 1       | 1 000 ms                  |
    /// | 2       | 2 000 ms                  |
    /// | 3       | (gives up)                |
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::SourceFailed`] wrapping the last error.
    pub async fn execute<T, F, Fut>(
        &self,
        source_name: &str,
        mut operation: F,
    ) -> Result<T, AnalyticsError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AnalyticsError>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !is_retriable(&err) || attempt >= self.max_attempts {
                if is_retriable(&err) {
                    tracing::warn!(
                        source = source_name,
                        attempts = attempt,
                        error = %err,
                        "retries exhausted"
                    );
                }
                return Err(AnalyticsError::SourceFailed {
                    source_name: source_name.to_owned(),
                    code: err.code(),
                    message: err.to_string(),
                    cause: Box::new(err),
                });
            }

            let delay = self.delay_for(attempt);
            tracing::warn!(
                source = source_name,
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "transient provider error, retrying after back-off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
