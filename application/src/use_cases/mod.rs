//! Use cases (application services)
//!
//! - [`dispatch_tool`] — validate, send, classify and record one tool call
//! - [`run_session`] — the reasoning loop state machine

pub mod dispatch_tool;
pub mod run_session;
pub(crate) mod shared;
