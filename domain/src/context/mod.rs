//! Session context: step history and intermediate values
//!
//! - [`StepRecord`] — immutable audit entry for one dispatched tool call
//! - [`StepSummary`] — compact line kept for every step, for the final report
//! - [`ContextStore`] — bounded history window plus last-write-wins named values
//! - [`extract_from_request`] — argument values named in the request text

pub mod entities;
pub mod request_args;
pub mod store;

pub use entities::{StepOutcome, StepRecord, StepSummary};
pub use request_args::extract_from_request;
pub use store::ContextStore;
