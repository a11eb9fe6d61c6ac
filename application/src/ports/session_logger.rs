//! Port for structured session logging.
//!
//! [`SessionLogger`] records prompts, planner answers, decisions and steps as
//! machine-readable events (JSONL in the file adapter). This is separate from
//! `tracing`, which carries human-readable diagnostics.

use serde_json::Value;

/// A structured session event.
pub struct SessionEvent {
    /// Event type identifier (e.g. "plan", "decision", "step").
    pub event_type: &'static str,
    pub payload: Value,
}

impl SessionEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Implementations write one record per event. Logging is synchronous and
/// infallible from the caller's point of view; write failures are dropped.
pub trait SessionLogger: Send + Sync {
    fn log(&self, event: SessionEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoSessionLogger;

impl SessionLogger for NoSessionLogger {
    fn log(&self, _event: SessionEvent) {}
}
