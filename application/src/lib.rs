//! Application layer for ce-agent
//!
//! This crate contains the use cases (tool dispatch and the reasoning loop),
//! the ports infrastructure adapters implement, and loop configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::{LoopConfig, TimeoutPolicy};
pub use ports::{
    loop_progress::{LoopProgressNotifier, NoLoopProgress},
    planner::{Planner, PlannerError},
    rpc_transport::{RpcTransport, TransportError},
    session_logger::{NoSessionLogger, SessionEvent, SessionLogger},
};
pub use use_cases::dispatch_tool::ToolDispatcher;
pub use use_cases::run_session::{
    ReportSource, RunSessionError, RunSessionUseCase, SessionReport, TerminationCause,
};
