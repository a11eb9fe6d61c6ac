//! Planner adapters
//!
//! The reasoning loop only sees the [`Planner`](ceagent_application::Planner)
//! port; this module supplies a backend that shells out to an external
//! command (an LLM CLI, a script wrapping an HTTP API, ...).

pub mod command;

pub use command::CommandPlanner;
