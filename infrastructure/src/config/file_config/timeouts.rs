//! Timeout configuration from TOML (`[timeouts]` section)

use ceagent_application::TimeoutPolicy;
use ceagent_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw per-class timeouts from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTimeoutsConfig {
    pub quick_secs: u64,
    pub standard_secs: u64,
    pub scan_secs: u64,
    /// Extra attempts after a timeout (scans are never retried)
    pub retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for FileTimeoutsConfig {
    fn default() -> Self {
        Self {
            quick_secs: 10,
            standard_secs: 30,
            scan_secs: 300,
            retries: 1,
            retry_backoff_ms: 500,
        }
    }
}

impl FileTimeoutsConfig {
    pub fn to_timeout_policy(&self) -> TimeoutPolicy {
        TimeoutPolicy {
            quick: Duration::from_secs(self.quick_secs),
            standard: Duration::from_secs(self.standard_secs),
            scan: Duration::from_secs(self.scan_secs),
            timeout_retries: self.retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        for (name, value) in [
            ("quick_secs", self.quick_secs),
            ("standard_secs", self.standard_secs),
            ("scan_secs", self.scan_secs),
        ] {
            if value == 0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::ZeroDuration,
                    format!("timeouts.{} cannot be 0", name),
                ));
            }
        }
        if self.scan_secs < self.standard_secs {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::ScanShorterThanStandard,
                format!(
                    "timeouts.scan_secs ({}) is shorter than timeouts.standard_secs ({})",
                    self.scan_secs, self.standard_secs
                ),
            ));
        }
        issues
    }
}
