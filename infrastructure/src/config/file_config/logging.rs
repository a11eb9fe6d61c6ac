//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL session transcript path; empty disables the transcript
    pub session_log: String,
}

impl FileLoggingConfig {
    pub fn session_log_path(&self) -> Option<PathBuf> {
        let trimmed = self.session_log.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }
}
