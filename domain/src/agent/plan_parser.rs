//! Plan parsing from planner output.
//!
//! Accepted shapes:
//!
//! ```json
//! {
//!   "task_type": "MEMORY_SEARCH",
//!   "subtasks": [
//!     {"id": "1", "description": "scan for the value", "tool": "scan_all", "args": {"value": "100"}},
//!     {"id": "2", "description": "read the first hit", "tool": "read_memory", "dependencies": ["1"]},
//!     "narrow the results"
//!   ]
//! }
//! ```
//!
//! `tasks` and `plan` are accepted in place of `subtasks`, and a bare array
//! of subtasks is a plan with the default task type.

use serde_json::Value;

use crate::agent::entities::{Plan, Subtask};

/// Stringify ids given as numbers; null and empty strings are `None`.
fn json_value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a plan from a JSON value.
///
/// Returns `None` if no subtask list is present or it is empty.
pub fn parse_plan_json(json: &Value) -> Option<Plan> {
    let (task_type, items) = match json {
        Value::Array(items) => (Plan::DEFAULT_TASK_TYPE.to_string(), items),
        Value::Object(obj) => {
            let task_type = obj
                .get("task_type")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .unwrap_or(Plan::DEFAULT_TASK_TYPE)
                .to_string();
            let items = ["subtasks", "tasks", "plan"]
                .iter()
                .find_map(|key| obj.get(*key).and_then(|v| v.as_array()))?;
            (task_type, items)
        }
        _ => return None,
    };

    let mut plan = Plan::new(task_type);
    for (index, item) in items.iter().enumerate() {
        if let Some(subtask) = parse_subtask(item, index) {
            plan = plan.with_subtask(subtask);
        }
    }

    if plan.is_empty() { None } else { Some(plan) }
}

fn parse_subtask(item: &Value, index: usize) -> Option<Subtask> {
    let default_id = format!("{}", index + 1);
    match item {
        Value::String(description) if !description.trim().is_empty() => {
            Some(Subtask::new(default_id, description.trim()))
        }
        Value::Object(obj) => {
            let id = obj
                .get("id")
                .and_then(json_value_to_string)
                .unwrap_or(default_id);
            let description = obj
                .get("description")
                .or_else(|| obj.get("task"))
                .and_then(|v| v.as_str())
                .unwrap_or("No description");

            let mut subtask = Subtask::new(id, description);

            if let Some(tool) = obj
                .get("tool")
                .or_else(|| obj.get("tool_name"))
                .and_then(|v| v.as_str())
                && tool != "null"
                && !tool.is_empty()
            {
                subtask = subtask.with_tool(tool);
            }

            if let Some(args) = obj
                .get("args")
                .or_else(|| obj.get("arguments"))
                .and_then(|v| v.as_object())
            {
                for (key, value) in args {
                    subtask = subtask.with_arg(key, value.clone());
                }
            }

            if let Some(dependencies) = obj
                .get("dependencies")
                .or_else(|| obj.get("depends_on"))
            {
                subtask.dependencies = match dependencies {
                    Value::Array(ids) => ids.iter().filter_map(json_value_to_string).collect(),
                    single => json_value_to_string(single).into_iter().collect(),
                };
            }
            Some(subtask)
        }
        _ => None,
    }
}
