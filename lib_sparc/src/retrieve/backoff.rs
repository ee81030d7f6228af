//! # Retry Policy
//!
//! Linear backoff and status allow-list used by the `ky_http` client.
//!
//! `reqwest-retry` ships an exponential policy and a strategy that treats
//! every 5xx as transient. The metadata services need something narrower:
//! a fixed number of attempts, a delay that grows by one unit per retry,
//! and retries only for an explicit list of status codes.

use std::collections::BTreeSet;
use std::time::{Duration, SystemTime};

use reqwest_retry::{
    default_on_request_failure, RetryDecision, RetryPolicy, Retryable, RetryableStrategy,
};

/// Total number of attempts, the first one included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;

/// Delay unit of the linear backoff (backoff factor 1).
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// Status codes that trigger a retry.
pub const DEFAULT_STATUS_FORCELIST: [u16; 7] = [404, 413, 429, 500, 502, 503, 504];

/// # Retry Configuration
///
/// Parameters shared by every session opened by an `ApiClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total number of attempts, including the first request.
    pub max_attempts: u32,
    /// The wait before retry `n` is `n * backoff_unit`.
    pub backoff_unit: Duration,
    /// Response status codes that are retried. Anything else is final.
    pub status_forcelist: BTreeSet<u16>,
}

impl Default for RetryConfig {
    /// Six attempts, one second unit, the standard transient status list.
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
            status_forcelist: DEFAULT_STATUS_FORCELIST.into_iter().collect(),
        }
    }
}

impl RetryConfig {
    /// Returns a copy of the configuration with a different backoff unit.
    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Returns a copy of the configuration with a different attempt budget.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Number of retries after the first attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_attempts.saturating_sub(1)
    }

    /// Builds the backoff policy for one session.
    pub fn policy(&self) -> LinearBackoff {
        LinearBackoff {
            max_retries: self.max_retries(),
            unit: self.backoff_unit,
        }
    }

    /// Builds the retryable strategy for one session.
    pub fn strategy(&self) -> StatusForcelist {
        StatusForcelist {
            statuses: self.status_forcelist.clone(),
        }
    }
}

/// # Linear Backoff
///
/// Waits `(n_past_retries + 1) * unit` before the next attempt and gives up
/// after `max_retries` retries.
#[derive(Debug, Clone, Copy)]
pub struct LinearBackoff {
    max_retries: u32,
    unit: Duration,
}

impl LinearBackoff {
    /// Delay to wait before the retry that follows `n_past_retries` retries.
    pub fn delay_for(&self, n_past_retries: u32) -> Duration {
        self.unit.saturating_mul(n_past_retries.saturating_add(1))
    }
}

impl RetryPolicy for LinearBackoff {
    fn should_retry(&self, _request_start_time: SystemTime, n_past_retries: u32) -> RetryDecision {
        if n_past_retries >= self.max_retries {
            return RetryDecision::DoNotRetry;
        }
        RetryDecision::Retry {
            execute_after: SystemTime::now() + self.delay_for(n_past_retries),
        }
    }
}

/// # Status Forcelist
///
/// Retries responses whose status is in the list. Transport failures are
/// classified by `reqwest-retry`'s default rules (connect errors and timeouts
/// are transient).
#[derive(Debug, Clone)]
pub struct StatusForcelist {
    statuses: BTreeSet<u16>,
}

impl StatusForcelist {
    /// Whether a response with this status should be retried.
    pub fn is_retryable(&self, status: u16) -> bool {
        self.statuses.contains(&status)
    }
}

impl RetryableStrategy for StatusForcelist {
    fn handle(
        &self,
        res: &Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(response) if self.is_retryable(response.status().as_u16()) => {
                Some(Retryable::Transient)
            }
            // Any other status goes back to the caller untouched.
            Ok(_) => None,
            Err(error) => default_on_request_failure(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delay_of(decision: RetryDecision) -> Option<Duration> {
        match decision {
            RetryDecision::Retry { execute_after } => Some(
                execute_after
                    .duration_since(SystemTime::now())
                    .unwrap_or(Duration::ZERO),
            ),
            RetryDecision::DoNotRetry => None,
        }
    }

    #[test]
    fn default_config_matches_metadata_service_policy() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 6);
        assert_eq!(config.max_retries(), 5);
        assert_eq!(config.backoff_unit, Duration::from_secs(1));
        let statuses: Vec<u16> = config.status_forcelist.iter().copied().collect();
        assert_eq!(statuses, vec![404, 413, 429, 500, 502, 503, 504]);
    }

    #[test]
    fn delay_grows_linearly() {
        let policy = RetryConfig::default().policy();
        let delays: Vec<u64> = (0..5).map(|n| policy.delay_for(n).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn policy_stops_after_budget_is_spent() {
        let policy = RetryConfig::default()
            .with_backoff_unit(Duration::from_millis(100))
            .policy();
        let start = SystemTime::now();

        for n in 0..5 {
            let delay = delay_of(policy.should_retry(start, n)).expect("retry expected");
            assert!(delay <= Duration::from_millis(100) * (n + 1));
        }
        assert!(delay_of(policy.should_retry(start, 5)).is_none());
        assert!(delay_of(policy.should_retry(start, 17)).is_none());
    }

    #[test]
    fn single_attempt_never_retries() {
        let policy = RetryConfig::default().with_max_attempts(1).policy();
        assert!(delay_of(policy.should_retry(SystemTime::now(), 0)).is_none());

        let policy = RetryConfig::default().with_max_attempts(0).policy();
        assert!(delay_of(policy.should_retry(SystemTime::now(), 0)).is_none());
    }

    #[test]
    fn forcelist_only_covers_listed_statuses() {
        let strategy = RetryConfig::default().strategy();
        for status in DEFAULT_STATUS_FORCELIST {
            assert!(strategy.is_retryable(status), "{status} should retry");
        }
        for status in [200, 201, 400, 401, 403, 405, 501] {
            assert!(!strategy.is_retryable(status), "{status} should not retry");
        }
    }
}
