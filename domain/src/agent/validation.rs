//! Configuration validation issues.
//!
//! Config sections report problems as [`ConfigIssue`]s with a severity,
//! so startup can abort on errors and merely log warnings.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// No bridge executable configured.
    MissingBridgeCommand,
    /// No planner command configured.
    MissingPlannerCommand,
    /// Iteration cap of zero: the loop could never dispatch.
    ZeroIterations,
    /// A timeout or budget of zero seconds.
    ZeroDuration,
    /// Confidence floor outside `[0, 1]`.
    ConfidenceOutOfRange,
    /// Scan timeout shorter than the standard timeout.
    ScanShorterThanStandard,
    /// Frame limit too small to carry ordinary responses.
    FrameLimitTooSmall,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", label, self.message)
    }
}
