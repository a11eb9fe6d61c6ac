//! Configuration file loading for ce-agent
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment: `CE_AGENT_<SECTION>__<KEY>`
//! 2. `--config <path>` specified file
//! 3. Project root: `./ce-agent.toml` or `./.ce-agent.toml`
//! 4. Global: `$XDG_CONFIG_HOME/ce-agent/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileBridgeConfig, FileConfig, FileLoggingConfig, FileOutputConfig,
    FilePlannerConfig, FileSessionConfig, FileTimeoutsConfig,
};
pub use loader::ConfigLoader;
