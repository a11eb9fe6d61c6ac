//! Session history entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tool::value_objects::{ErrorKind, ToolError, ToolResult};

/// Outcome of one dispatched tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    Success,
    Failure,
}

impl StepOutcome {
    pub fn as_str(&self) -> &str {
        match self {
            StepOutcome::Success => "success",
            StepOutcome::Failure => "failure",
        }
    }
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable audit entry for one executed tool call.
///
/// Records are only handed out by shared reference once appended to a
/// [`ContextStore`](super::store::ContextStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Sequence index, strictly increasing within a session
    pub index: usize,
    pub tool_name: String,
    /// Arguments as resolved at dispatch time (coerced when validation passed)
    pub arguments: Map<String, Value>,
    pub outcome: StepOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl StepRecord {
    /// Build a record from a dispatch result.
    pub fn from_result(index: usize, arguments: Map<String, Value>, result: &ToolResult) -> Self {
        Self {
            index,
            tool_name: result.tool_name.clone(),
            arguments,
            outcome: if result.success {
                StepOutcome::Success
            } else {
                StepOutcome::Failure
            },
            result: result.result.clone(),
            error: result.error.clone(),
            timestamp: Utc::now(),
            duration_ms: result.metadata.duration_ms.unwrap_or(0),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == StepOutcome::Success
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    pub fn summary(&self) -> StepSummary {
        StepSummary {
            index: self.index,
            tool_name: self.tool_name.clone(),
            outcome: self.outcome,
            error_kind: self.error_kind(),
            message: self.error.as_ref().map(|e| e.message.clone()),
        }
    }
}

/// Compact per-step line kept for every step, including evicted ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSummary {
    pub index: usize,
    pub tool_name: String,
    pub outcome: StepOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StepSummary {
    pub fn is_success(&self) -> bool {
        self.outcome == StepOutcome::Success
    }
}
