//! Infrastructure layer for ce-agent
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the stdio bridge channel, the command-backed planner,
//! the bridge tool catalog, configuration file loading and the JSONL
//! session transcript.

pub mod bridge;
pub mod config;
pub mod logging;
pub mod planner;
pub mod tools;

// Re-export commonly used types
pub use bridge::{
    BridgeError, ChannelConfig, DEFAULT_MAX_FRAME_BYTES, JsonFrameDecoder, StdioChannel,
    error::Result,
};
pub use config::{
    ConfigLoader, ConfigValidationError, FileBridgeConfig, FileConfig, FileLoggingConfig,
    FileOutputConfig, FilePlannerConfig, FileSessionConfig, FileTimeoutsConfig,
};
pub use logging::JsonlSessionLogger;
pub use planner::CommandPlanner;
pub use tools::{TOOL_ALIASES, bridge_tool_catalog, default_registry};
