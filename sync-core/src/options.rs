//! Run configuration shared by the planner and the executor.

use std::time::Duration;
use thiserror::Error;

use neosync_types::{RuleSet, SyncError};

use crate::transfer::RetryPolicy;

/// Default number of retries after a failed attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default number of paths per delete request.
pub const DEFAULT_BATCH_SIZE: usize = 25;

/// Default minimum gap between consecutive API calls.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_secs(1);

/// Errors in run configuration.
#[derive(Debug, Error)]
pub enum OptionsError {
    /// Delete batches must hold at least one path.
    #[error("batch size must be at least 1")]
    ZeroBatchSize,

    /// The remote API must never be called back-to-back.
    #[error("rate limit must be greater than zero")]
    ZeroRateLimit,

    /// Retries must wait before firing.
    #[error("retry delay must be greater than zero")]
    ZeroRetryDelay,

    /// A protection pattern did not parse.
    #[error(transparent)]
    Pattern(#[from] SyncError),
}

/// One configuration struct for a sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Report the plan without calling mutating endpoints.
    pub dry_run: bool,
    /// Retries after a failed attempt.
    pub max_retries: u32,
    /// Paths per delete request.
    pub batch_size: usize,
    /// Minimum gap between consecutive API calls.
    pub rate_limit: Duration,
    /// Delay before the first retry.
    pub retry_delay: Duration,
    /// Cap on any retry delay.
    pub max_retry_delay: Duration,
    /// Patterns shielding remote-only paths from deletion.
    pub protected_patterns: Vec<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            max_retries: DEFAULT_MAX_RETRIES,
            batch_size: DEFAULT_BATCH_SIZE,
            rate_limit: DEFAULT_RATE_LIMIT,
            retry_delay: Duration::from_secs(2),
            max_retry_delay: Duration::from_secs(30),
            protected_patterns: Vec::new(),
        }
    }
}

impl SyncOptions {
    /// Reject values the executor cannot honor.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.batch_size == 0 {
            return Err(OptionsError::ZeroBatchSize);
        }
        if self.rate_limit.is_zero() {
            return Err(OptionsError::ZeroRateLimit);
        }
        if self.retry_delay.is_zero() {
            return Err(OptionsError::ZeroRetryDelay);
        }
        Ok(())
    }

    /// Retry policy derived from these options.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_delay).with_max_delay(self.max_retry_delay)
    }

    /// Compile the protection patterns.
    pub fn protection_rules(&self) -> Result<RuleSet, OptionsError> {
        Ok(RuleSet::parse_all(&self.protected_patterns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = SyncOptions::default();
        assert!(options.validate().is_ok());
        assert!(!options.dry_run);
        assert_eq!(options.max_retries, 3);
        assert_eq!(options.rate_limit, Duration::from_secs(1));
    }

    #[test]
    fn zero_values_rejected() {
        let options = SyncOptions {
            batch_size: 0,
            ..SyncOptions::default()
        };
        assert!(matches!(options.validate(), Err(OptionsError::ZeroBatchSize)));

        let options = SyncOptions {
            rate_limit: Duration::ZERO,
            ..SyncOptions::default()
        };
        assert!(matches!(options.validate(), Err(OptionsError::ZeroRateLimit)));

        let options = SyncOptions {
            retry_delay: Duration::ZERO,
            ..SyncOptions::default()
        };
        assert!(matches!(options.validate(), Err(OptionsError::ZeroRetryDelay)));
    }

    #[test]
    fn retry_policy_follows_options() {
        let options = SyncOptions {
            max_retries: 5,
            retry_delay: Duration::from_millis(250),
            max_retry_delay: Duration::from_secs(1),
            ..SyncOptions::default()
        };
        let policy = options.retry_policy();
        assert_eq!(policy.max_attempts(), 6);
        assert_eq!(policy.delay_before_retry(1), Duration::from_millis(250));
        assert_eq!(policy.delay_before_retry(4), Duration::from_secs(1));
    }

    #[test]
    fn protection_rules_compile() {
        let options = SyncOptions {
            protected_patterns: vec!["*.mp3".into(), "music/".into()],
            ..SyncOptions::default()
        };
        let rules = options.protection_rules().unwrap();
        assert!(rules.matches("music/a.wav"));

        let bad = SyncOptions {
            protected_patterns: vec!["[oops".into()],
            ..SyncOptions::default()
        };
        assert!(matches!(bad.protection_rules(), Err(OptionsError::Pattern(_))));
    }
}
