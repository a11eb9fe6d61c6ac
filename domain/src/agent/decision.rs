//! Decision: the structured outcome of interpreting planner text

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entities::Subtask;

/// Next action chosen by the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Decision {
    Continue {
        tool: String,
        #[serde(default)]
        args: Map<String, Value>,
    },
    /// Replace the remaining plan. An empty subplan asks for a fresh plan.
    Adjust {
        #[serde(default)]
        plan: Vec<Subtask>,
    },
    Abort {
        #[serde(default)]
        reason: String,
    },
    Finalize {
        #[serde(default)]
        report: String,
    },
}

impl Decision {
    pub fn kind(&self) -> DecisionKind {
        match self {
            Decision::Continue { .. } => DecisionKind::Continue,
            Decision::Adjust { .. } => DecisionKind::Adjust,
            Decision::Abort { .. } => DecisionKind::Abort,
            Decision::Finalize { .. } => DecisionKind::Finalize,
        }
    }

    pub fn continue_with(tool: impl Into<String>, args: Map<String, Value>) -> Self {
        Decision::Continue {
            tool: tool.into(),
            args,
        }
    }
}

/// Tag of a [`Decision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionKind {
    Continue,
    Adjust,
    Abort,
    Finalize,
}

impl DecisionKind {
    pub fn as_str(&self) -> &str {
        match self {
            DecisionKind::Continue => "Continue",
            DecisionKind::Adjust => "Adjust",
            DecisionKind::Abort => "Abort",
            DecisionKind::Finalize => "Finalize",
        }
    }

    /// Parse a kind, accepting common synonyms (case-insensitive).
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "continue" | "call" | "execute" | "tool" | "tool_call" => Some(DecisionKind::Continue),
            "adjust" | "replan" | "recover" => Some(DecisionKind::Adjust),
            "abort" | "stop" | "fail" => Some(DecisionKind::Abort),
            "finalize" | "finalise" | "done" | "complete" | "finish" => {
                Some(DecisionKind::Finalize)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which stage of the interpreter's fallback chain produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Strict,
    Repaired,
    Heuristic,
    Empty,
}

impl ExtractionMethod {
    /// Stage confidence before any self-reported cap.
    pub fn confidence(&self) -> f64 {
        match self {
            ExtractionMethod::Strict => 1.0,
            ExtractionMethod::Repaired => 0.7,
            ExtractionMethod::Heuristic => 0.4,
            ExtractionMethod::Empty => 0.0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ExtractionMethod::Strict => "strict",
            ExtractionMethod::Repaired => "repaired",
            ExtractionMethod::Heuristic => "heuristic",
            ExtractionMethod::Empty => "empty",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A decision together with how confidently it was extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    /// `None` is the empty decision
    pub decision: Option<Decision>,
    pub confidence: f64,
    pub method: ExtractionMethod,
    /// Prose preceding the structured part, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
}

impl Interpretation {
    pub fn empty() -> Self {
        Self {
            decision: None,
            confidence: ExtractionMethod::Empty.confidence(),
            method: ExtractionMethod::Empty,
            thought: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.decision.is_none()
    }

    pub fn kind(&self) -> Option<DecisionKind> {
        self.decision.as_ref().map(Decision::kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_synonyms() {
        assert_eq!(DecisionKind::parse("CONTINUE"), Some(DecisionKind::Continue));
        assert_eq!(DecisionKind::parse("replan"), Some(DecisionKind::Adjust));
        assert_eq!(DecisionKind::parse(" done "), Some(DecisionKind::Finalize));
        assert_eq!(DecisionKind::parse("stop"), Some(DecisionKind::Abort));
        assert_eq!(DecisionKind::parse("dance"), None);
    }

    #[test]
    fn test_decision_serializes_with_kind_tag() {
        let mut args = Map::new();
        args.insert("value".into(), json!("10000"));
        let value = serde_json::to_value(Decision::continue_with("scan_all", args)).unwrap();
        assert_eq!(
            value,
            json!({"kind": "Continue", "tool": "scan_all", "args": {"value": "10000"}})
        );
    }

    #[test]
    fn test_empty_interpretation() {
        let empty = Interpretation::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.confidence, 0.0);
        assert_eq!(empty.kind(), None);
    }
}
