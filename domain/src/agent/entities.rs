//! Reasoning loop entities: loop states and the subtask plan

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// State of the reasoning loop.
///
/// ```text
/// PLANNING → SELECTING → EXECUTING → OBSERVING ─┬─ Continue  → SELECTING
///     ▲                                          ├─ Adjusting → PLANNING
///     └──────────────────────────────────────────┤
///                                                ├─ Finalizing → Done
///                                                └─ Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Planning,
    Selecting,
    Executing,
    Observing,
    Adjusting,
    Finalizing,
    Done,
    Aborted,
}

impl LoopState {
    pub fn as_str(&self) -> &str {
        match self {
            LoopState::Planning => "planning",
            LoopState::Selecting => "selecting",
            LoopState::Executing => "executing",
            LoopState::Observing => "observing",
            LoopState::Adjusting => "adjusting",
            LoopState::Finalizing => "finalizing",
            LoopState::Done => "done",
            LoopState::Aborted => "aborted",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            LoopState::Planning => "Planning",
            LoopState::Selecting => "Selecting",
            LoopState::Executing => "Executing",
            LoopState::Observing => "Observing",
            LoopState::Adjusting => "Adjusting",
            LoopState::Finalizing => "Finalizing",
            LoopState::Done => "Done",
            LoopState::Aborted => "Aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Done | LoopState::Aborted)
    }
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One step of a plan. `tool` and `args` are hints; the planner may pick
/// something else during selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub args: Map<String, Value>,
    /// Ids of subtasks that must have a successful step before this one runs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl Subtask {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            tool: None,
            args: Map::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }
}

/// Ordered list of subtasks produced by the planning collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub task_type: String,
    pub subtasks: Vec<Subtask>,
}

impl Plan {
    pub const DEFAULT_TASK_TYPE: &'static str = "COMPREHENSIVE_ANALYSIS";

    pub fn new(task_type: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            subtasks: Vec::new(),
        }
    }

    pub fn with_subtask(mut self, subtask: Subtask) -> Self {
        self.subtasks.push(subtask);
        self
    }

    /// Single-subtask plan used when the planner returns nothing usable.
    pub fn fallback(request: &str) -> Self {
        Self::new(Self::DEFAULT_TASK_TYPE).with_subtask(Subtask::new("1", request.trim()))
    }

    pub fn is_empty(&self) -> bool {
        self.subtasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.subtasks.len()
    }

    pub fn get(&self, position: usize) -> Option<&Subtask> {
        self.subtasks.get(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_state_terminal() {
        assert!(LoopState::Done.is_terminal());
        assert!(LoopState::Aborted.is_terminal());
        assert!(!LoopState::Finalizing.is_terminal());
        assert_eq!(LoopState::Observing.as_str(), "observing");
    }

    #[test]
    fn test_fallback_plan_has_one_subtask() {
        let plan = Plan::fallback("  find the health value ");
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.task_type, Plan::DEFAULT_TASK_TYPE);
        assert_eq!(plan.subtasks[0].description, "find the health value");
        assert!(plan.subtasks[0].tool.is_none());
    }
}
