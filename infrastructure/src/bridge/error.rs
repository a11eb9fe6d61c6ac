//! Error types for the bridge channel

use thiserror::Error;

/// Result type alias for bridge channel operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors raised while opening or driving the bridge subprocess.
///
/// Per-request failures reach the dispatcher as
/// [`TransportError`](ceagent_application::TransportError); this type covers
/// startup and the channel internals.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Failed to spawn bridge process '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Bridge did not become ready: {0}")]
    NotReady(String),

    #[error("Bridge I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Pending frame of {size} bytes exceeds the {limit} byte limit")]
    FrameTooLarge { size: usize, limit: usize },

    #[error("Bridge channel closed")]
    Closed,
}
