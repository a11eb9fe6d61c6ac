//! Per-class tool timeouts.

use ceagent_domain::TimeoutClass;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maps a [`TimeoutClass`] to a concrete duration, plus the bounded retry
/// applied to timed-out calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutPolicy {
    pub quick: Duration,
    pub standard: Duration,
    pub scan: Duration,
    /// Extra attempts after a timeout (never applied to scans).
    pub timeout_retries: u32,
    /// Delay before the first retry; doubled on each further attempt.
    pub retry_backoff: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            quick: Duration::from_secs(10),
            standard: Duration::from_secs(30),
            scan: Duration::from_secs(300),
            timeout_retries: 1,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl TimeoutPolicy {
    pub fn for_class(&self, class: TimeoutClass) -> Duration {
        match class {
            TimeoutClass::Quick => self.quick,
            TimeoutClass::Standard => self.standard,
            TimeoutClass::Scan => self.scan,
        }
    }

    /// Retries allowed after a timeout for `class`.
    pub fn retries_for(&self, class: TimeoutClass) -> u32 {
        match class {
            TimeoutClass::Scan => 0,
            _ => self.timeout_retries,
        }
    }

    /// Backoff before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_class() {
        let policy = TimeoutPolicy::default();
        assert_eq!(policy.for_class(TimeoutClass::Quick), Duration::from_secs(10));
        assert_eq!(policy.for_class(TimeoutClass::Standard), Duration::from_secs(30));
        assert_eq!(policy.for_class(TimeoutClass::Scan), Duration::from_secs(300));
    }

    #[test]
    fn test_scans_are_not_retried() {
        let policy = TimeoutPolicy::default();
        assert_eq!(policy.retries_for(TimeoutClass::Scan), 0);
        assert_eq!(policy.retries_for(TimeoutClass::Quick), 1);
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = TimeoutPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff(3), Duration::from_millis(2000));
    }
}
