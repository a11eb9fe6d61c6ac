//! Planner port
//!
//! The planner is a black box that turns a prompt into free-form text; the
//! response interpreter in the domain layer turns that text into decisions.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a planner backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    #[error("planner did not answer within {0}s")]
    Timeout(u64),

    #[error("planner failed: {0}")]
    Failed(String),

    #[error("planner unavailable: {0}")]
    Unavailable(String),
}

/// Text completion backend consulted by the reasoning loop.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Answer `prompt` with free-form text.
    async fn complete(&self, prompt: &str) -> Result<String, PlannerError>;

    /// Short label for logs and reports.
    fn name(&self) -> &str {
        "planner"
    }
}
