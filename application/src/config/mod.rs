//! Application-level configuration.
//!
//! - [`LoopConfig`] — reasoning loop bounds (iterations, wall-clock budget, confidence floor)
//! - [`TimeoutPolicy`] — per-class tool timeouts and timeout retry policy

pub mod loop_config;
pub mod timeout_policy;

pub use loop_config::LoopConfig;
pub use timeout_policy::TimeoutPolicy;
