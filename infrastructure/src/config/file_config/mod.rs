//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application types
//! (`LoopConfig`, `TimeoutPolicy`, `ChannelConfig`) at the composition root.

mod bridge;
mod logging;
mod output;
mod planner;
mod session;
mod timeouts;

pub use bridge::FileBridgeConfig;
pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use planner::FilePlannerConfig;
pub use session::FileSessionConfig;
pub use timeouts::FileTimeoutsConfig;

use ceagent_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration rejected at startup
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("invalid configuration:\n{}", bullet_list(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn bullet_list(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("  - {}", issue))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Bridge subprocess settings
    pub bridge: FileBridgeConfig,
    /// Per-class request timeouts
    pub timeouts: FileTimeoutsConfig,
    /// Reasoning loop limits
    pub session: FileSessionConfig,
    /// Planner command
    pub planner: FilePlannerConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Session transcript
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.bridge.validate());
        issues.extend(self.timeouts.validate());
        issues.extend(self.session.validate());

        if !self.planner.is_configured() {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::MissingPlannerCommand,
                "planner.command is empty; sessions cannot run until one is configured",
            ));
        }

        issues
    }

    /// Fail on error-severity issues; return the warnings.
    pub fn check(&self) -> Result<Vec<ConfigIssue>, ConfigValidationError> {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            self.validate().into_iter().partition(|i| i.is_error());
        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(ConfigValidationError::Invalid(errors))
        }
    }
}
