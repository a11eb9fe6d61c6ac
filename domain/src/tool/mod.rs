//! Tool domain module
//!
//! Defines the parameter contract of the remote bridge commands.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────────────┐    ┌──────────────┐
//! │ ToolRegistry │───▶│ validate_and_coerce  │───▶│ ToolResult   │
//! │ (catalog)    │    │ (defaults, coercion) │    │ (envelope)   │
//! └──────┬───────┘    └──────────────────────┘    └──────────────┘
//!        │
//!        ├─ aliases: "scan" → "scan_all"
//!        └─ tools:   "scan_all" → ToolDescriptor
//! ```
//!
//! # Key Types
//!
//! - [`ToolRegistry`] — explicitly constructed catalog, injected into the dispatcher
//! - [`ToolDescriptor`] — name, category, ordered [`ParameterSpec`]s, [`TimeoutClass`]
//! - [`ToolResult`] / [`ToolError`] — the uniform dispatch envelope
//! - [`ErrorKind`] — failure taxonomy

pub mod coerce;
pub mod entities;
pub mod registry;
pub mod value_objects;

pub use entities::{ParamType, ParameterSpec, TimeoutClass, ToolCategory, ToolDescriptor};
pub use registry::ToolRegistry;
pub use value_objects::{ErrorDetails, ErrorKind, ToolError, ToolResult, ToolResultMetadata};
