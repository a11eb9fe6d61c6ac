//! Response interpreter: free-form planner text → [`Decision`].
//!
//! Ordered fallback chain, stopping at the first success:
//!
//! | Stage | Method | Confidence |
//! |-------|--------|------------|
//! | 1 | Strict parse of a fenced block or top-level span | 1.0 |
//! | 2 | Syntactic repair, then parse | 0.7 |
//! | 3 | Heuristic `key: value` / `key = value` scan | 0.4 |
//! | 4 | Empty decision | 0.0 |
//!
//! A numeric `confidence` in `[0, 1]` reported by the model caps the stage
//! confidence. Interpretation is pure and never fails.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::decision::{Decision, DecisionKind, ExtractionMethod, Interpretation};
use super::entities::Plan;
use super::json_repair::{self, Candidate};
use super::plan_parser::parse_plan_json;
use crate::tool::coerce::infer_scalar;

const KIND_KEYS: &[&str] = &["kind", "action", "next_action", "decision"];
const TOOL_KEYS: &[&str] = &["tool", "selected_tool", "next_tool", "function", "tool_name"];
const ARGS_KEYS: &[&str] = &["args", "tool_args", "arguments", "parameters"];
const REPORT_KEYS: &[&str] = &["report", "summary", "answer", "result"];
const REASON_KEYS: &[&str] = &["reason", "message", "error"];
const THOUGHT_KEYS: &[&str] = &["thought", "reasoning", "analysis"];
const PLAN_KEYS: &[&str] = &["plan", "subtasks", "tasks"];

static KEY_VALUE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"\b([A-Za-z_][A-Za-z0-9_]*)\s*[:=]\s*("[^"\n]*"|'[^'\n]*'|[^\s,;}]+)"#).ok()
});

/// Interpret planner text as a decision.
pub fn interpret(text: &str) -> Interpretation {
    let found = json_repair::candidates(text);

    // 1. strict
    let mut unparsed: Vec<&Candidate<'_>> = Vec::new();
    for candidate in &found {
        match serde_json::from_str::<Value>(candidate.text.trim()) {
            Ok(value) => {
                if let Some(interpretation) =
                    from_value(&value, ExtractionMethod::Strict, text, candidate.start)
                {
                    return interpretation;
                }
            }
            Err(_) => unparsed.push(candidate),
        }
    }

    // 2. repair
    for candidate in unparsed {
        let repaired = json_repair::repair(candidate.text);
        if let Ok(value) = serde_json::from_str::<Value>(&repaired)
            && let Some(interpretation) =
                from_value(&value, ExtractionMethod::Repaired, text, candidate.start)
        {
            return interpretation;
        }
    }

    // 3. heuristic
    if let Some(interpretation) = heuristic(text) {
        return interpretation;
    }

    // 4. give up
    Interpretation {
        thought: clean_thought(text),
        ..Interpretation::empty()
    }
}

/// Interpret planner text as a subtask plan, with the method that produced it.
pub fn interpret_plan(text: &str) -> Option<(Plan, ExtractionMethod)> {
    let found = json_repair::candidates(text);

    let mut unparsed = Vec::new();
    for candidate in &found {
        match serde_json::from_str::<Value>(candidate.text.trim()) {
            Ok(value) => {
                if let Some(plan) = parse_plan_json(&value) {
                    return Some((plan, ExtractionMethod::Strict));
                }
            }
            Err(_) => unparsed.push(candidate),
        }
    }

    unparsed.into_iter().find_map(|candidate| {
        serde_json::from_str::<Value>(&json_repair::repair(candidate.text))
            .ok()
            .and_then(|value| parse_plan_json(&value))
            .map(|plan| (plan, ExtractionMethod::Repaired))
    })
}

/// Build a decision from a parsed JSON object. Returns the decision and any
/// self-reported confidence, or `None` when the object is not decision-shaped.
pub fn decision_from_value(value: &Value) -> Option<(Decision, Option<f64>)> {
    let obj = value.as_object()?;

    let kind = first_str(obj, KIND_KEYS).and_then(DecisionKind::parse);
    let tool = first_str(obj, TOOL_KEYS)
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != "null" && *t != "none");

    let decision = match (kind, tool) {
        (Some(DecisionKind::Continue), Some(tool)) | (None, Some(tool)) => Decision::Continue {
            tool: tool.to_string(),
            args: extract_args(obj),
        },
        (Some(DecisionKind::Continue), None) | (None, None) => return None,
        (Some(DecisionKind::Adjust), _) => Decision::Adjust {
            plan: PLAN_KEYS
                .iter()
                .find_map(|key| obj.get(*key))
                .and_then(|plan| {
                    parse_plan_json(plan).or_else(|| parse_plan_json(&Value::Object(obj.clone())))
                })
                .map(|plan| plan.subtasks)
                .unwrap_or_default(),
        },
        (Some(DecisionKind::Abort), _) => Decision::Abort {
            reason: first_text(obj, REASON_KEYS).unwrap_or_default(),
        },
        (Some(DecisionKind::Finalize), _) => Decision::Finalize {
            report: first_text(obj, REPORT_KEYS).unwrap_or_default(),
        },
    };

    let reported = obj
        .get("confidence")
        .and_then(|c| match c {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|c| (0.0..=1.0).contains(c));

    Some((decision, reported))
}

fn from_value(
    value: &Value,
    method: ExtractionMethod,
    text: &str,
    start: usize,
) -> Option<Interpretation> {
    let (decision, reported) = decision_from_value(value)?;
    let stage = method.confidence();
    let thought = clean_thought(&text[..start]).or_else(|| {
        value
            .as_object()
            .and_then(|obj| first_str(obj, THOUGHT_KEYS))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    });
    Some(Interpretation {
        decision: Some(decision),
        confidence: reported.map_or(stage, |r| r.min(stage)),
        method,
        thought,
    })
}

fn heuristic(text: &str) -> Option<Interpretation> {
    let pattern = KEY_VALUE.as_ref()?;
    let mut obj = Map::new();
    for caps in pattern.captures_iter(text) {
        let key = caps[1].to_ascii_lowercase();
        if obj.contains_key(&key) {
            continue;
        }
        obj.insert(key, infer_scalar(&caps[2]));
    }
    if obj.is_empty() {
        return None;
    }

    // loose keys become tool args when none were given explicitly
    if !ARGS_KEYS.iter().any(|k| obj.contains_key(*k)) {
        let args: Map<String, Value> = obj
            .iter()
            .filter(|(k, _)| !is_reserved(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        obj.insert("args".into(), Value::Object(args));
    }

    let (decision, reported) = decision_from_value(&Value::Object(obj))?;
    let stage = ExtractionMethod::Heuristic.confidence();
    Some(Interpretation {
        decision: Some(decision),
        confidence: reported.map_or(stage, |r| r.min(stage)),
        method: ExtractionMethod::Heuristic,
        thought: None,
    })
}

fn is_reserved(key: &str) -> bool {
    [
        KIND_KEYS,
        TOOL_KEYS,
        ARGS_KEYS,
        REPORT_KEYS,
        REASON_KEYS,
        THOUGHT_KEYS,
        PLAN_KEYS,
    ]
    .iter()
    .any(|keys| keys.contains(&key))
        || key == "confidence"
}

fn extract_args(obj: &Map<String, Value>) -> Map<String, Value> {
    ARGS_KEYS
        .iter()
        .find_map(|key| match obj.get(*key) {
            Some(Value::Object(args)) => Some(args.clone()),
            Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Object(args)) => Some(args),
                _ => None,
            },
            _ => None,
        })
        .unwrap_or_default()
}

fn first_str<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| obj.get(*key).and_then(|v| v.as_str()))
}

/// Like [`first_str`], but renders non-string values as JSON.
fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    })
}

/// Prose preceding the structured part, minus fence markers and a
/// leading `Thought:` label.
fn clean_thought(prefix: &str) -> Option<String> {
    let mut lines: Vec<&str> = prefix.lines().collect();
    while lines
        .last()
        .is_some_and(|l| l.trim().is_empty() || l.trim().starts_with("```"))
    {
        lines.pop();
    }
    let joined = lines.join("\n");
    let trimmed = joined.trim();
    let label_len = "thought:".len();
    let stripped = if trimmed.len() >= label_len
        && trimmed.is_char_boundary(label_len)
        && trimmed[..label_len].eq_ignore_ascii_case("thought:")
    {
        trimmed[label_len..].trim()
    } else {
        trimmed
    };
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_string())
    }
}
