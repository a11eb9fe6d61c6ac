//! Tool domain value objects: the uniform result and error envelope
//!
//! Every dispatch produces exactly one [`ToolResult`]. Failures carry a
//! [`ToolError`] whose [`ErrorKind`] drives how the reasoning loop reacts:
//!
//! | Kind | Code | Loop reaction |
//! |------|------|---------------|
//! | `ParameterError` | `PARAMETER_ERROR` | Observation; planner can re-derive args |
//! | `ConnectionError` | `CONNECTION_ERROR` | Terminates the session |
//! | `TimeoutError` | `TIMEOUT_ERROR` | Observation; may be retried |
//! | `ExecutionError` | `EXECUTION_ERROR` | Observation |
//! | `ServerError` | `SERVER_ERROR` | Observation |
//! | `UnknownError` | `UNKNOWN_ERROR` | Treated as `ServerError` |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Failure taxonomy shared by the dispatcher, loop and report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ParameterError,
    ConnectionError,
    TimeoutError,
    ExecutionError,
    ServerError,
    UnknownError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorKind::ParameterError => "ParameterError",
            ErrorKind::ConnectionError => "ConnectionError",
            ErrorKind::TimeoutError => "TimeoutError",
            ErrorKind::ExecutionError => "ExecutionError",
            ErrorKind::ServerError => "ServerError",
            ErrorKind::UnknownError => "UnknownError",
        }
    }

    /// Wire code used in the `error.code` field of the envelope.
    pub fn code(&self) -> &str {
        match self {
            ErrorKind::ParameterError => "PARAMETER_ERROR",
            ErrorKind::ConnectionError => "CONNECTION_ERROR",
            ErrorKind::TimeoutError => "TIMEOUT_ERROR",
            ErrorKind::ExecutionError => "EXECUTION_ERROR",
            ErrorKind::ServerError => "SERVER_ERROR",
            ErrorKind::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Only a lost connection ends a session; everything else is an observation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::ConnectionError)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Offending command and arguments attached to an error envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub command: String,
    pub args: Map<String, Value>,
}

/// Uniform structured representation of any dispatch failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolError {
    pub kind: ErrorKind,
    pub message: String,
    /// Name of the offending parameter, for parameter errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

impl ToolError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            parameter: None,
            details: None,
        }
    }

    pub fn with_details(mut self, command: impl Into<String>, args: Map<String, Value>) -> Self {
        self.details = Some(ErrorDetails {
            command: command.into(),
            args,
        });
        self
    }

    // Common error constructors
    pub fn unknown_tool(name: &str) -> Self {
        Self::new(
            ErrorKind::ParameterError,
            format!("Unknown tool: {}", name),
        )
    }

    pub fn missing_parameter(tool: &str, parameter: &str) -> Self {
        Self {
            parameter: Some(parameter.to_string()),
            ..Self::new(
                ErrorKind::ParameterError,
                format!("Missing required parameter '{}' for {}", parameter, tool),
            )
        }
    }

    pub fn invalid_parameter(parameter: &str, expected: impl std::fmt::Display, got: &Value) -> Self {
        Self {
            parameter: Some(parameter.to_string()),
            ..Self::new(
                ErrorKind::ParameterError,
                format!(
                    "Parameter '{}' expects {}, got {}",
                    parameter,
                    expected,
                    crate::core::string::compact_json(got, 64)
                ),
            )
        }
    }

    pub fn timeout(command: &str, seconds: f64) -> Self {
        Self::new(
            ErrorKind::TimeoutError,
            format!("{} timed out after {:.1}s", command, seconds),
        )
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConnectionError, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServerError, message)
    }

    /// Code string of the kind (`PARAMETER_ERROR`, ...)
    pub fn code(&self) -> &str {
        self.kind.code()
    }

    /// Wire form: `{code, message, details}`.
    pub fn to_envelope(&self) -> Value {
        let mut error = Map::new();
        error.insert("code".into(), Value::String(self.code().to_string()));
        error.insert("message".into(), Value::String(self.message.clone()));
        if let Some(details) = &self.details {
            error.insert(
                "details".into(),
                serde_json::json!({"command": details.command, "args": details.args}),
            );
        }
        Value::Object(error)
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for ToolError {}

/// Result of a dispatch, carrying the payload or the error envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Name of the tool that was dispatched
    pub tool_name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
    #[serde(default)]
    pub metadata: ToolResultMetadata,
}

/// Structured metadata about a dispatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResultMetadata {
    /// Duration of the call in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Index of the step record this result produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_index: Option<usize>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(tool_name: impl Into<String>, result: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            result: Some(result),
            error: None,
            metadata: ToolResultMetadata::default(),
        }
    }

    /// Create a failed result
    pub fn failure(tool_name: impl Into<String>, error: ToolError) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            result: None,
            error: Some(error),
            metadata: ToolResultMetadata::default(),
        }
    }

    /// Add duration metadata
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.metadata.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_step_index(mut self, index: usize) -> Self {
        self.metadata.step_index = Some(index);
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> Option<&ToolError> {
        self.error.as_ref()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// Dispatcher envelope: `{success, result?, error?}`.
    pub fn to_envelope(&self) -> Value {
        let mut envelope = Map::new();
        envelope.insert("success".into(), Value::Bool(self.success));
        if let Some(result) = &self.result {
            envelope.insert("result".into(), result.clone());
        }
        if let Some(error) = &self.error {
            envelope.insert("error".into(), error.to_envelope());
        }
        Value::Object(envelope)
    }
}
