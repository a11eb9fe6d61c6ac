//! Reasoning loop parameters.
//!
//! [`LoopConfig`] groups the static bounds of
//! [`RunSessionUseCase`](crate::use_cases::run_session::RunSessionUseCase).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Loop control parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Hard cap on selection rounds; exceeding it forces finalization.
    pub max_iterations: usize,
    /// Wall-clock budget for the whole session.
    pub time_budget: Duration,
    /// Interpretations below this confidence trigger one re-prompt.
    pub confidence_floor: f64,
    /// Number of full step records kept in context.
    pub history_window: usize,
    /// Number of recent steps rendered into prompts.
    pub prompt_history: usize,
    /// Consecutive failed steps that trigger re-planning.
    pub max_consecutive_failures: usize,
    /// Re-planning rounds allowed before giving up.
    pub max_adjustments: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            time_budget: Duration::from_secs(300),
            confidence_floor: 0.5,
            history_window: 200,
            prompt_history: 5,
            max_consecutive_failures: 3,
            max_adjustments: 3,
        }
    }
}

impl LoopConfig {
    // ==================== Builder Methods ====================

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn with_confidence_floor(mut self, floor: f64) -> Self {
        self.confidence_floor = floor.clamp(0.0, 1.0);
        self
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn with_prompt_history(mut self, n: usize) -> Self {
        self.prompt_history = n;
        self
    }

    pub fn with_max_consecutive_failures(mut self, n: usize) -> Self {
        self.max_consecutive_failures = n;
        self
    }

    pub fn with_max_adjustments(mut self, n: usize) -> Self {
        self.max_adjustments = n;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoopConfig::default();
        assert_eq!(config.max_iterations, 20);
        assert_eq!(config.time_budget, Duration::from_secs(300));
        assert_eq!(config.confidence_floor, 0.5);
        assert_eq!(config.max_consecutive_failures, 3);
    }

    #[test]
    fn test_builder_clamps_floor() {
        let config = LoopConfig::default()
            .with_max_iterations(3)
            .with_confidence_floor(1.5);
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.confidence_floor, 1.0);
    }
}
