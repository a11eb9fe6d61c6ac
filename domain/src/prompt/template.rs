//! Prompt templates for the reasoning loop

use crate::agent::entities::{Plan, Subtask};
use crate::context::entities::StepRecord;
use crate::core::string::{compact_json, truncate};
use crate::tool::entities::ToolDescriptor;

/// Maximum rendered size of one step payload inside a prompt.
const MAX_PAYLOAD_CHARS: usize = 600;

/// What the loop knows when it asks the planner for something.
pub struct PromptContext<'a> {
    pub request: &'a str,
    pub tools: &'a [&'a ToolDescriptor],
    pub history: &'a [&'a StepRecord],
    pub values: &'a [(&'a str, &'a serde_json::Value)],
}

/// Templates for generating prompts at each loop state
pub struct PromptTemplate;

impl PromptTemplate {
    /// Prompt for PLANNING: produce a subtask list.
    pub fn planning(ctx: &PromptContext<'_>) -> String {
        format!(
            r#"You are a memory-analysis agent controlling a debugger bridge attached to a live process.

User request:
{}

Available tools:
{}
{}
Break the request into subtasks. Respond with JSON only:
{{"task_type": "<short label>", "subtasks": [{{"id": "1", "description": "...", "tool": "<tool name or null>", "args": {{}}, "dependencies": []}}]}}"#,
            ctx.request,
            Self::tool_list(ctx.tools),
            Self::history_section(ctx.history),
        )
    }

    /// Prompt for SELECTING: choose the next tool call for `subtask`.
    pub fn selection(ctx: &PromptContext<'_>, plan: &Plan, subtask: &Subtask) -> String {
        let subtasks: Vec<String> = plan
            .subtasks
            .iter()
            .map(|s| {
                let marker = if s.id == subtask.id { ">" } else { " " };
                format!("{} {}. {}", marker, s.id, s.description)
            })
            .collect();
        format!(
            r#"User request:
{}

Plan ({}):
{}

Available tools:
{}
{}{}
Choose the next action for the marked subtask. Respond with JSON only:
{{"kind": "Continue", "tool": "<tool name>", "args": {{...}}}}
or {{"kind": "Finalize", "report": "..."}} if the request is answered."#,
            ctx.request,
            plan.task_type,
            subtasks.join("\n"),
            Self::tool_list(ctx.tools),
            Self::history_section(ctx.history),
            Self::values_section(ctx.values),
        )
    }

    /// Prompt for OBSERVING: classify the next action after the latest step.
    pub fn observation(ctx: &PromptContext<'_>, remaining: usize) -> String {
        format!(
            r#"User request:
{}
{}{}
Subtasks remaining in the plan: {}

Decide what to do next. Respond with JSON only, one of:
{{"kind": "Continue", "tool": "<tool name>", "args": {{...}}}}
{{"kind": "Adjust", "plan": {{"subtasks": [...]}}}}
{{"kind": "Abort", "reason": "..."}}
{{"kind": "Finalize", "report": "..."}}"#,
            ctx.request,
            Self::history_section(ctx.history),
            Self::values_section(ctx.values),
            remaining,
        )
    }

    /// Re-prompt after a low-confidence interpretation.
    pub fn reprompt(previous_prompt: &str, previous_response: &str) -> String {
        format!(
            r#"{}

Your previous answer could not be parsed reliably:
{}

Answer again with a single JSON object and nothing else."#,
            previous_prompt,
            truncate(previous_response, 1000),
        )
    }

    fn tool_list(tools: &[&ToolDescriptor]) -> String {
        tools
            .iter()
            .map(|t| {
                if t.description.is_empty() {
                    format!("- {}", t.signature())
                } else {
                    format!("- {}: {}", t.signature(), t.description)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn history_section(history: &[&StepRecord]) -> String {
        if history.is_empty() {
            return String::new();
        }
        let mut section = String::from("\nRecent steps:\n");
        for step in history {
            let outcome = match (&step.result, &step.error) {
                (_, Some(error)) => format!("{}: {}", error.kind, error.message),
                (Some(result), None) => compact_json(result, MAX_PAYLOAD_CHARS),
                (None, None) => "ok".to_string(),
            };
            section.push_str(&format!(
                "[{}] {}({}) -> {} {}\n",
                step.index,
                step.tool_name,
                serde_json::Value::Object(step.arguments.clone()),
                step.outcome,
                outcome
            ));
        }
        section
    }

    fn values_section(values: &[(&str, &serde_json::Value)]) -> String {
        if values.is_empty() {
            return String::new();
        }
        let mut section = String::from("\nKnown values:\n");
        for (key, value) in values {
            section.push_str(&format!("- {} = {}\n", key, compact_json(value, 200)));
        }
        section
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::entities::{ParamType, ParameterSpec, ToolCategory};
    use crate::tool::value_objects::{ToolError, ToolResult};
    use serde_json::{Map, json};

    fn tool() -> ToolDescriptor {
        ToolDescriptor::new("read_memory", ToolCategory::MemoryRead)
            .describe("Read raw bytes")
            .with_parameter(ParameterSpec::required("address", ParamType::Integer))
    }

    #[test]
    fn test_planning_lists_tools_and_request() {
        let t = tool();
        let tools = [&t];
        let ctx = PromptContext {
            request: "find the gold counter",
            tools: &tools,
            history: &[],
            values: &[],
        };
        let prompt = PromptTemplate::planning(&ctx);
        assert!(prompt.contains("find the gold counter"));
        assert!(prompt.contains("- read_memory(address: integer): Read raw bytes"));
        assert!(!prompt.contains("Recent steps"));
    }

    #[test]
    fn test_observation_renders_errors() {
        let failed = ToolResult::failure("read_memory", ToolError::server("access violation"));
        let record = StepRecord::from_result(2, Map::new(), &failed);
        let history = [&record];
        let value = json!(4096);
        let values = [("base", &value)];
        let ctx = PromptContext {
            request: "r",
            tools: &[],
            history: &history,
            values: &values,
        };
        let prompt = PromptTemplate::observation(&ctx, 1);
        assert!(prompt.contains("[2] read_memory({}) -> failure ServerError: access violation"));
        assert!(prompt.contains("- base = 4096"));
    }

    #[test]
    fn test_selection_marks_current_subtask() {
        let plan = Plan::new("SCAN")
            .with_subtask(Subtask::new("1", "scan"))
            .with_subtask(Subtask::new("2", "narrow"));
        let ctx = PromptContext {
            request: "r",
            tools: &[],
            history: &[],
            values: &[],
        };
        let prompt = PromptTemplate::selection(&ctx, &plan, &plan.subtasks[1]);
        assert!(prompt.contains("  1. scan"));
        assert!(prompt.contains("> 2. narrow"));
    }
}
