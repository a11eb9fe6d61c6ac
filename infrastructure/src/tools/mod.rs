//! Bridge tool definitions
//!
//! The bridge exposes a fixed set of remote commands. They are described
//! once, in [`catalog`], and loaded into the domain
//! [`ToolRegistry`](ceagent_domain::ToolRegistry) the dispatcher validates
//! against.
//!
//! Categories: basic, process, memory_read, pattern_scan, debug,
//! breakpoint and dbvm.

pub mod catalog;

pub use catalog::{TOOL_ALIASES, bridge_tool_catalog, default_registry};
