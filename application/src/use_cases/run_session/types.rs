//! Types for the RunSession use case.

use ceagent_domain::{ErrorKind, LoopState, Plan, StepSummary};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that prevent a session from starting.
///
/// Once the loop runs, every outcome (including a lost connection or an
/// exhausted budget) ends in a [`SessionReport`] instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunSessionError {
    #[error("bridge transport is not open")]
    TransportClosed,

    #[error("session cancelled before it started")]
    Cancelled,
}

impl RunSessionError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunSessionError::Cancelled)
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum TerminationCause {
    /// The planner declared the request answered.
    Finalized,
    /// The planner gave up.
    Aborted { reason: String },
    IterationCapReached,
    TimeBudgetExhausted,
    /// A dispatch failed with `ConnectionError`.
    ConnectionLost { message: String },
    /// Re-planning after consecutive failures exceeded its allowance.
    RepeatedFailures,
    /// Planner-requested adjustments exceeded their allowance.
    AdjustmentLimit,
    /// Every subtask of the plan was executed.
    PlanExhausted,
    /// No usable decision and no tool hint to fall back on.
    PlannerUnresponsive,
    Cancelled,
}

impl TerminationCause {
    pub fn as_str(&self) -> &str {
        match self {
            TerminationCause::Finalized => "finalized",
            TerminationCause::Aborted { .. } => "aborted",
            TerminationCause::IterationCapReached => "iteration_cap_reached",
            TerminationCause::TimeBudgetExhausted => "time_budget_exhausted",
            TerminationCause::ConnectionLost { .. } => "connection_lost",
            TerminationCause::RepeatedFailures => "repeated_failures",
            TerminationCause::AdjustmentLimit => "adjustment_limit",
            TerminationCause::PlanExhausted => "plan_exhausted",
            TerminationCause::PlannerUnresponsive => "planner_unresponsive",
            TerminationCause::Cancelled => "cancelled",
        }
    }

    /// The session was cut short before the planner could conclude.
    pub fn is_partial(&self) -> bool {
        matches!(
            self,
            TerminationCause::IterationCapReached
                | TerminationCause::TimeBudgetExhausted
                | TerminationCause::ConnectionLost { .. }
                | TerminationCause::Cancelled
        )
    }
}

impl std::fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationCause::Finalized => write!(f, "finalized by planner"),
            TerminationCause::Aborted { reason } if reason.is_empty() => {
                write!(f, "aborted by planner")
            }
            TerminationCause::Aborted { reason } => write!(f, "aborted by planner: {}", reason),
            TerminationCause::IterationCapReached => write!(f, "iteration cap reached"),
            TerminationCause::TimeBudgetExhausted => write!(f, "time budget exhausted"),
            TerminationCause::ConnectionLost { message } => {
                write!(f, "connection lost: {}", message)
            }
            TerminationCause::RepeatedFailures => {
                write!(f, "gave up after repeated failures")
            }
            TerminationCause::AdjustmentLimit => write!(f, "adjustment limit reached"),
            TerminationCause::PlanExhausted => write!(f, "plan completed"),
            TerminationCause::PlannerUnresponsive => write!(f, "planner gave no usable decision"),
            TerminationCause::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Where the report text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSource {
    Planner,
    Synthesized,
}

/// Final outcome of a session, built from the full step ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub request: String,
    pub plan: Plan,
    /// Every step of the session, evicted ones included
    pub steps: Vec<StepSummary>,
    pub cause: TerminationCause,
    pub final_state: LoopState,
    pub report: String,
    pub report_source: ReportSource,
    pub iterations: usize,
    pub adjustments: usize,
    pub elapsed_ms: u64,
}

impl SessionReport {
    pub fn success_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.steps.len() - self.success_count()
    }

    pub fn is_partial(&self) -> bool {
        self.cause.is_partial()
    }

    /// The step whose failure ended the session, if the connection was lost.
    pub fn terminating_step(&self) -> Option<&StepSummary> {
        match self.cause {
            TerminationCause::ConnectionLost { .. } => self
                .steps
                .iter()
                .rev()
                .find(|s| s.error_kind == Some(ErrorKind::ConnectionError)),
            _ => None,
        }
    }
}

/// Plain-text report over the step ledger, used when the planner did not
/// supply one.
pub fn synthesize_report(request: &str, steps: &[StepSummary], cause: &TerminationCause) -> String {
    let successes = steps.iter().filter(|s| s.is_success()).count();
    let mut text = format!(
        "Request: {}\nOutcome: {}{}\nSteps: {} ({} succeeded, {} failed)\n",
        request,
        cause,
        if cause.is_partial() { " (partial)" } else { "" },
        steps.len(),
        successes,
        steps.len() - successes,
    );
    for step in steps {
        match (&step.error_kind, &step.message) {
            (Some(kind), Some(message)) => text.push_str(&format!(
                "  [{}] {} failed: {}: {}\n",
                step.index, step.tool_name, kind, message
            )),
            (Some(kind), None) => {
                text.push_str(&format!("  [{}] {} failed: {}\n", step.index, step.tool_name, kind))
            }
            _ => text.push_str(&format!("  [{}] {} ok\n", step.index, step.tool_name)),
        }
    }
    text
}
