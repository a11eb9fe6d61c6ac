//! Domain layer for ce-agent
//!
//! This crate contains the core types and pure logic of the agent.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Tools
//!
//! Every remote bridge command is described by a [`ToolDescriptor`] held in
//! an explicitly constructed [`ToolRegistry`], which validates and coerces
//! planner-supplied arguments against one parameter contract per tool.
//!
//! ## Context
//!
//! A session's [`ContextStore`] records one immutable [`StepRecord`] per
//! dispatch and keeps named intermediate values for argument resolution.
//!
//! ## Interpretation
//!
//! Planner output is free-form text. [`interpret`] turns it into a
//! [`Decision`] through a strict → repair → heuristic → empty fallback chain.

pub mod agent;
pub mod config;
pub mod context;
pub mod core;
pub mod prompt;
pub mod tool;

// Re-export commonly used types
pub use agent::{
    decision::{Decision, DecisionKind, ExtractionMethod, Interpretation},
    entities::{LoopState, Plan, Subtask},
    interpreter::{decision_from_value, interpret, interpret_plan},
    plan_parser::parse_plan_json,
    validation::{ConfigIssue, ConfigIssueCode, Severity},
};
pub use config::OutputFormat;
pub use context::{ContextStore, StepOutcome, StepRecord, StepSummary, extract_from_request};
pub use core::{error::DomainError, string::truncate};
pub use prompt::{PromptContext, PromptTemplate};
pub use tool::{
    ErrorDetails, ErrorKind, ParamType, ParameterSpec, TimeoutClass, ToolCategory,
    ToolDescriptor, ToolError, ToolRegistry, ToolResult, ToolResultMetadata,
};
