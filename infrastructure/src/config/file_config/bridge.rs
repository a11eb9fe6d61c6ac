//! Bridge process configuration from TOML (`[bridge]` section)

use crate::bridge::{ChannelConfig, DEFAULT_MAX_FRAME_BYTES};
use ceagent_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Frames smaller than this cannot carry ordinary responses.
const MIN_FRAME_BYTES: usize = 4 * 1024;

/// Raw bridge configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBridgeConfig {
    /// Executable that runs the bridge
    pub command: String,
    pub args: Vec<String>,
    pub startup_timeout_secs: u64,
    pub shutdown_timeout_secs: u64,
    /// Method sent once at startup; empty disables the probe
    pub ready_probe: String,
    pub max_frame_bytes: usize,
}

impl Default for FileBridgeConfig {
    fn default() -> Self {
        Self {
            command: "python".to_string(),
            args: vec!["MCP_Server/mcp_cheatengine.py".to_string()],
            startup_timeout_secs: 5,
            shutdown_timeout_secs: 5,
            ready_probe: "ping".to_string(),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl FileBridgeConfig {
    pub fn to_channel_config(&self) -> ChannelConfig {
        let probe = self.ready_probe.trim();
        ChannelConfig {
            startup_timeout: Duration::from_secs(self.startup_timeout_secs),
            shutdown_timeout: Duration::from_secs(self.shutdown_timeout_secs),
            ready_probe: (!probe.is_empty()).then(|| probe.to_string()),
            max_frame_bytes: self.max_frame_bytes,
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.command.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::MissingBridgeCommand,
                "bridge.command is empty",
            ));
        }
        if self.startup_timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroDuration,
                "bridge.startup_timeout_secs cannot be 0",
            ));
        }
        if self.max_frame_bytes < MIN_FRAME_BYTES {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::FrameLimitTooSmall,
                format!(
                    "bridge.max_frame_bytes is {}; responses larger than that will disconnect the bridge",
                    self.max_frame_bytes
                ),
            ));
        }
        issues
    }
}
