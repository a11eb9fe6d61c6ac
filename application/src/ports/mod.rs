//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod loop_progress;
pub mod planner;
pub mod rpc_transport;
pub mod session_logger;
