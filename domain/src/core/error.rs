//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Tool '{0}' is already registered with a different shape")]
    ConflictingRegistration(String),

    #[error("Invalid tool descriptor '{tool}': {reason}")]
    InvalidDescriptor { tool: String, reason: String },

    #[error("Step index {got} is not after the last recorded index {last}")]
    NonMonotonicStep { last: usize, got: usize },

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::ConflictingRegistration("ping".into()).is_cancelled());
        assert!(!DomainError::NonMonotonicStep { last: 3, got: 2 }.is_cancelled());
    }

    #[test]
    fn test_conflict_display_names_tool() {
        let error = DomainError::ConflictingRegistration("read_memory".to_string());
        assert!(error.to_string().contains("read_memory"));
    }
}
