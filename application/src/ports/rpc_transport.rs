//! RPC transport port
//!
//! The reasoning loop and dispatcher reach the bridge only through
//! [`RpcTransport`]; whether bytes travel over child-process pipes, a socket,
//! or an in-memory script is an infrastructure detail.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single request at the transport boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// No response arrived within the per-call timeout. The channel stays open.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// The peer went away; every pending and future request fails with this.
    #[error("disconnected: {0}")]
    Disconnected(String),

    /// The peer answered with an `error` object.
    #[error("remote error {code}: {message}")]
    Remote { code: i64, message: String },

    /// Anything else the transport could not make sense of.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl TransportError {
    pub fn is_disconnect(&self) -> bool {
        matches!(self, TransportError::Disconnected(_))
    }
}

/// Request/response exchange with the remote bridge.
///
/// One transport belongs to one session. Implementations may keep a
/// background reader draining the peer while callers wait.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Send `{id, method, params}` and wait up to `timeout` for the matching
    /// response's `result`.
    async fn send(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, TransportError>;

    /// Terminate the peer and fail all in-flight requests with
    /// [`TransportError::Disconnected`]. Idempotent.
    async fn close(&self);

    /// Whether further sends can succeed.
    fn is_open(&self) -> bool;
}
