//! Agent domain module
//!
//! Pure reasoning-loop concepts: loop states, subtask plans, decisions and
//! the response interpreter that extracts them from planner text.

pub mod decision;
pub mod entities;
pub mod interpreter;
pub mod json_repair;
pub mod plan_parser;
pub mod validation;

pub use decision::{Decision, DecisionKind, ExtractionMethod, Interpretation};
pub use entities::{LoopState, Plan, Subtask};
pub use interpreter::{interpret, interpret_plan};
