//! Reasoning loop limits from TOML (`[session]` section)

use ceagent_application::LoopConfig;
use ceagent_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw session limits from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    pub max_iterations: usize,
    pub time_budget_secs: u64,
    /// Interpretations below this confidence are re-prompted once
    pub confidence_floor: f64,
    pub history_window: usize,
    /// Recent steps shown to the planner
    pub prompt_history: usize,
    pub max_consecutive_failures: usize,
    pub max_adjustments: usize,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        let defaults = LoopConfig::default();
        Self {
            max_iterations: defaults.max_iterations,
            time_budget_secs: defaults.time_budget.as_secs(),
            confidence_floor: defaults.confidence_floor,
            history_window: defaults.history_window,
            prompt_history: defaults.prompt_history,
            max_consecutive_failures: defaults.max_consecutive_failures,
            max_adjustments: defaults.max_adjustments,
        }
    }
}

impl FileSessionConfig {
    pub fn to_loop_config(&self) -> LoopConfig {
        LoopConfig::default()
            .with_max_iterations(self.max_iterations)
            .with_time_budget(Duration::from_secs(self.time_budget_secs))
            .with_confidence_floor(self.confidence_floor)
            .with_history_window(self.history_window)
            .with_prompt_history(self.prompt_history)
            .with_max_consecutive_failures(self.max_consecutive_failures)
            .with_max_adjustments(self.max_adjustments)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.max_iterations == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroIterations,
                "session.max_iterations cannot be 0",
            ));
        }
        if self.time_budget_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroDuration,
                "session.time_budget_secs cannot be 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_floor) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ConfidenceOutOfRange,
                format!(
                    "session.confidence_floor must be within [0, 1], got {}",
                    self.confidence_floor
                ),
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_loop_config() {
        let config = FileSessionConfig {
            max_iterations: 7,
            time_budget_secs: 60,
            ..Default::default()
        };
        let loop_config = config.to_loop_config();
        assert_eq!(loop_config.max_iterations, 7);
        assert_eq!(loop_config.time_budget, Duration::from_secs(60));
        assert_eq!(loop_config.confidence_floor, 0.5);
    }

    #[test]
    fn test_validate_floor_range() {
        let config = FileSessionConfig {
            confidence_floor: 1.5,
            ..Default::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, ConfigIssueCode::ConfidenceOutOfRange);
    }
}
