//! Reasoning loop progress port.
//!
//! [`LoopProgressNotifier`] is an **output port** that the presentation layer
//! implements to show the loop's state transitions and tool calls while a
//! session runs. All methods default to no-ops.

use ceagent_domain::{Interpretation, LoopState, Plan, ToolResult};

pub trait LoopProgressNotifier: Send + Sync {
    /// Called on every state transition
    fn on_state_change(&self, _from: LoopState, _to: LoopState) {}

    /// Called when a (re)plan has been accepted
    fn on_plan(&self, _plan: &Plan) {}

    /// Called with each interpreted planner answer
    fn on_decision(&self, _interpretation: &Interpretation) {}

    /// Called when a low-confidence answer triggers a re-prompt
    fn on_reprompt(&self, _confidence: f64) {}

    /// Called before a tool is dispatched
    fn on_tool_call(&self, _tool_name: &str, _args: &str) {}

    /// Called after a dispatch returned
    fn on_tool_result(&self, _result: &ToolResult) {}

    /// Called once when the loop stops
    fn on_session_end(&self, _state: LoopState, _cause: &str) {}
}

/// No-op notifier
pub struct NoLoopProgress;

impl LoopProgressNotifier for NoLoopProgress {}
