//! Planner command configuration from TOML (`[planner]` section)

use crate::planner::CommandPlanner;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw planner configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePlannerConfig {
    /// Command that answers a prompt on stdin; required to run a session
    pub command: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for FilePlannerConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            timeout_secs: 120,
        }
    }
}

impl FilePlannerConfig {
    pub fn is_configured(&self) -> bool {
        !self.command.trim().is_empty()
    }

    /// Build the planner, or `None` when no command is configured.
    pub fn to_planner(&self) -> Option<CommandPlanner> {
        self.is_configured().then(|| {
            CommandPlanner::new(self.command.trim(), self.args.clone())
                .with_timeout(Duration::from_secs(self.timeout_secs))
        })
    }
}
