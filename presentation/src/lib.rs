//! Presentation layer for ce-agent
//!
//! This crate contains the CLI definition, session report formatters
//! and loop progress reporters.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat};
pub use output::{ConsoleFormatter, OutputFormatter};
pub use progress::reporter::{ProgressReporter, SimpleProgress};
