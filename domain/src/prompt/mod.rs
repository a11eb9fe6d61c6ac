//! Prompt domain
//!
//! Templates for the prompts sent to the planning collaborator at each
//! state of the reasoning loop.

mod template;

pub use template::{PromptContext, PromptTemplate};
