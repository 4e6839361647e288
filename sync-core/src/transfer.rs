//! Transfer unit state machine for neosync.
//!
//! One transfer unit is a single upload or a single delete batch. This
//! module provides a pure, side-effect-free state machine for its retry
//! lifecycle. The state machine takes events as input and produces a new
//! state plus a list of actions to execute.
//!
//! ```text
//! Pending → Attempting(1) → Succeeded
//!                ↓ fail
//!           Attempting(2) → ... → Succeeded | Failed
//! ```
//!
//! The actual I/O (sleeping, calling the API) is performed by sync-client,
//! not by this module.

use std::time::Duration;

/// Lower bound on any retry delay. A retry never fires immediately.
pub const MIN_RETRY_DELAY: Duration = Duration::from_millis(1);

/// Bounded retry with progressive backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = 1 + max_retries).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Cap on any single retry delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the default delay cap.
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            ..Self::default()
        }
    }

    /// Set the delay cap.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Total attempts a unit may make.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (1-based).
    ///
    /// Doubles per retry from `base_delay`, capped at `max_delay`, never
    /// below [`MIN_RETRY_DELAY`].
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
            .max(MIN_RETRY_DELAY)
    }
}

/// Lifecycle of one transfer unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferState {
    /// Not started.
    Pending,
    /// Attempt in progress.
    Attempting {
        /// 1-based attempt number.
        attempt: u32,
    },
    /// Completed successfully.
    Succeeded {
        /// Attempts it took.
        attempts: u32,
    },
    /// Gave up after exhausting retries.
    Failed {
        /// Attempts made.
        attempts: u32,
        /// Error from the last attempt.
        error: String,
    },
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// Begin the unit.
    Start,
    /// The current attempt succeeded.
    AttemptSucceeded,
    /// The current attempt failed.
    AttemptFailed {
        /// What went wrong.
        error: String,
    },
}

/// Side effects the caller must perform, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferAction {
    /// Issue attempt number `attempt`.
    Attempt {
        /// 1-based attempt number.
        attempt: u32,
    },
    /// Sleep before the next attempt.
    Backoff {
        /// How long to wait.
        delay: Duration,
    },
}

impl TransferState {
    /// Create a new unit in the Pending state.
    pub fn new() -> Self {
        Self::Pending
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. Terminal states ignore
    /// every event, as do events that make no sense in the current state.
    pub fn on_event(self, event: TransferEvent, policy: &RetryPolicy) -> (Self, Vec<TransferAction>) {
        match (self, event) {
            (Self::Pending, TransferEvent::Start) => (
                Self::Attempting { attempt: 1 },
                vec![TransferAction::Attempt { attempt: 1 }],
            ),

            (Self::Attempting { attempt }, TransferEvent::AttemptSucceeded) => {
                (Self::Succeeded { attempts: attempt }, vec![])
            }

            (Self::Attempting { attempt }, TransferEvent::AttemptFailed { error }) => {
                if attempt < policy.max_attempts() {
                    let next = attempt + 1;
                    (
                        Self::Attempting { attempt: next },
                        vec![
                            TransferAction::Backoff {
                                delay: policy.delay_before_retry(attempt),
                            },
                            TransferAction::Attempt { attempt: next },
                        ],
                    )
                } else {
                    (
                        Self::Failed {
                            attempts: attempt,
                            error,
                        },
                        vec![],
                    )
                }
            }

            (state, _) => (state, vec![]),
        }
    }

    /// Whether the unit has reached Succeeded or Failed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }

    /// Attempts made so far.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Pending => 0,
            Self::Attempting { attempt } => *attempt,
            Self::Succeeded { attempts } | Self::Failed { attempts, .. } => *attempts,
        }
    }
}

impl Default for TransferState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(msg: &str) -> TransferEvent {
        TransferEvent::AttemptFailed { error: msg.into() }
    }

    // ===========================================
    // Transition Tests
    // ===========================================

    #[test]
    fn starts_pending() {
        let state = TransferState::new();
        assert_eq!(state, TransferState::Pending);
        assert_eq!(state.attempts(), 0);
        assert!(!state.is_terminal());
    }

    #[test]
    fn start_issues_first_attempt() {
        let (state, actions) = TransferState::new().on_event(TransferEvent::Start, &RetryPolicy::default());
        assert_eq!(state, TransferState::Attempting { attempt: 1 });
        assert_eq!(actions, vec![TransferAction::Attempt { attempt: 1 }]);
    }

    #[test]
    fn success_is_terminal() {
        let policy = RetryPolicy::default();
        let (state, _) = TransferState::new().on_event(TransferEvent::Start, &policy);
        let (state, actions) = state.on_event(TransferEvent::AttemptSucceeded, &policy);

        assert_eq!(state, TransferState::Succeeded { attempts: 1 });
        assert!(actions.is_empty());
        assert!(state.is_terminal());
    }

    #[test]
    fn failure_schedules_backoff_then_retry() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        let (state, _) = TransferState::new().on_event(TransferEvent::Start, &policy);
        let (state, actions) = state.on_event(failed("503"), &policy);

        assert_eq!(state, TransferState::Attempting { attempt: 2 });
        assert_eq!(
            actions,
            vec![
                TransferAction::Backoff {
                    delay: Duration::from_millis(500)
                },
                TransferAction::Attempt { attempt: 2 },
            ]
        );
    }

    #[test]
    fn always_failing_unit_makes_one_plus_max_retries_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let (mut state, mut actions) = TransferState::new().on_event(TransferEvent::Start, &policy);
        let mut attempts = 0;

        while !state.is_terminal() {
            attempts += actions
                .iter()
                .filter(|a| matches!(a, TransferAction::Attempt { .. }))
                .count();
            let (next, next_actions) = state.on_event(failed("boom"), &policy);
            state = next;
            actions = next_actions;
        }

        assert_eq!(attempts, 4);
        assert_eq!(
            state,
            TransferState::Failed {
                attempts: 4,
                error: "boom".into()
            }
        );
    }

    #[test]
    fn zero_retries_fails_after_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10));
        let (state, _) = TransferState::new().on_event(TransferEvent::Start, &policy);
        let (state, actions) = state.on_event(failed("nope"), &policy);
        assert!(matches!(state, TransferState::Failed { attempts: 1, .. }));
        assert!(actions.is_empty());
    }

    #[test]
    fn terminal_states_ignore_events() {
        let policy = RetryPolicy::default();
        let done = TransferState::Succeeded { attempts: 2 };
        let (state, actions) = done.clone().on_event(failed("late"), &policy);
        assert_eq!(state, done);
        assert!(actions.is_empty());

        let gave_up = TransferState::Failed {
            attempts: 4,
            error: "x".into(),
        };
        let (state, actions) = gave_up.clone().on_event(TransferEvent::Start, &policy);
        assert_eq!(state, gave_up);
        assert!(actions.is_empty());
    }

    #[test]
    fn pending_ignores_attempt_results() {
        let (state, actions) =
            TransferState::new().on_event(TransferEvent::AttemptSucceeded, &RetryPolicy::default());
        assert_eq!(state, TransferState::Pending);
        assert!(actions.is_empty());
    }

    // ===========================================
    // Backoff Tests
    // ===========================================

    #[test]
    fn backoff_doubles_per_retry() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        assert_eq!(policy.delay_before_retry(1), Duration::from_secs(1));
        assert_eq!(policy.delay_before_retry(2), Duration::from_secs(2));
        assert_eq!(policy.delay_before_retry(3), Duration::from_secs(4));
    }

    #[test]
    fn backoff_capped_at_max_delay() {
        let policy = RetryPolicy::new(10, Duration::from_secs(1)).with_max_delay(Duration::from_secs(5));
        assert_eq!(policy.delay_before_retry(10), Duration::from_secs(5));
        assert_eq!(policy.delay_before_retry(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn backoff_never_zero() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        assert_eq!(policy.delay_before_retry(1), MIN_RETRY_DELAY);
    }
}
