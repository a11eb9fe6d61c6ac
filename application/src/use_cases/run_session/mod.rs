//! Run Session use case
//!
//! Drives the reasoning loop for one request:
//!
//! ```text
//! PLANNING → SELECTING → EXECUTING → OBSERVING ─┬─ Continue  → SELECTING
//!     ▲                                          ├─ Adjust    → ADJUSTING → PLANNING
//!     │                                          ├─ Finalize  → FINALIZING → DONE
//!     │                                          └─ Abort     → ABORTED
//! ```
//!
//! The loop issues at most one dispatch at a time, so context ordering is
//! deterministic. A hard iteration cap and a wall-clock budget bound every
//! session; hitting either forces FINALIZING with a partial report. Only a
//! closed transport at start-up (or cancellation before start) is an error;
//! every other outcome is a [`SessionReport`].

mod types;

pub use types::{ReportSource, RunSessionError, SessionReport, TerminationCause, synthesize_report};

use crate::config::LoopConfig;
use crate::ports::loop_progress::LoopProgressNotifier;
use crate::ports::planner::{Planner, PlannerError};
use crate::ports::rpc_transport::RpcTransport;
use crate::ports::session_logger::{NoSessionLogger, SessionEvent, SessionLogger};
use crate::use_cases::dispatch_tool::ToolDispatcher;
use crate::use_cases::shared::{check_cancelled, is_cancelled};
use ceagent_domain::core::string::compact_json;
use ceagent_domain::{
    ContextStore, Decision, ErrorKind, Interpretation, LoopState, Plan, PromptContext,
    PromptTemplate, Subtask, ToolDescriptor, extract_from_request, interpret, interpret_plan,
};
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Named values rendered into prompts, most recent first.
const PROMPT_VALUES: usize = 20;

/// What a state handler decided.
enum Transition {
    Next(LoopState),
    /// Stop via FINALIZING → DONE (or ABORTED for an abort cause).
    Stop(TerminationCause),
}

/// Why the loop went to ADJUSTING.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdjustReason {
    Failures,
    Requested,
}

/// A planner call that did not produce text.
enum Interrupt {
    Cancelled,
    Deadline,
    Planner(PlannerError),
}

/// Mutable state of one session.
struct Session {
    request: String,
    context: ContextStore,
    plan: Plan,
    cursor: usize,
    /// Ids of subtasks of the current plan that produced a successful step
    completed: HashSet<String>,
    /// Continue decision taken while observing, consumed by the next selection
    pending: Option<(String, Map<String, Value>)>,
    selected: Option<(String, Map<String, Value>)>,
    proposed_plan: Option<Plan>,
    adjust_reason: AdjustReason,
    iterations: usize,
    adjustments: usize,
    failure_streak: usize,
    final_report: Option<String>,
    deadline: Instant,
}

impl Session {
    fn current_subtask(&self) -> Option<&Subtask> {
        self.plan.get(self.cursor)
    }

    fn remaining_subtasks(&self) -> usize {
        self.plan.len().saturating_sub(self.cursor)
    }

    /// Dependencies of `subtask` with no successful step yet.
    fn unmet_dependencies<'a>(&self, subtask: &'a Subtask) -> Vec<&'a str> {
        subtask
            .dependencies
            .iter()
            .filter(|id| !self.completed.contains(id.as_str()))
            .map(String::as_str)
            .collect()
    }
}

/// Use case for running one reasoning session against the bridge.
pub struct RunSessionUseCase<P: Planner, T: RpcTransport> {
    planner: Arc<P>,
    dispatcher: ToolDispatcher<T>,
    config: LoopConfig,
    cancellation_token: Option<CancellationToken>,
    session_logger: Arc<dyn SessionLogger>,
}

impl<P: Planner + 'static, T: RpcTransport + 'static> RunSessionUseCase<P, T> {
    pub fn new(planner: Arc<P>, dispatcher: ToolDispatcher<T>) -> Self {
        Self {
            planner,
            dispatcher,
            config: LoopConfig::default(),
            cancellation_token: None,
            session_logger: Arc::new(NoSessionLogger),
        }
    }

    pub fn with_config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    /// Set a cancellation token. Cancelling stops new dispatches and closes
    /// the transport, failing any in-flight request.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn with_session_logger(mut self, logger: Arc<dyn SessionLogger>) -> Self {
        self.session_logger = logger;
        self
    }

    /// Run the loop for `request` until it finalizes or aborts.
    pub async fn run(
        &self,
        request: &str,
        progress: &dyn LoopProgressNotifier,
    ) -> Result<SessionReport, RunSessionError> {
        check_cancelled(&self.cancellation_token)?;
        if !self.dispatcher.transport().is_open() {
            return Err(RunSessionError::TransportClosed);
        }

        let started = Instant::now();
        let mut session = Session {
            request: request.to_string(),
            context: ContextStore::new(self.config.history_window),
            plan: Plan::fallback(request),
            cursor: 0,
            completed: HashSet::new(),
            pending: None,
            selected: None,
            proposed_plan: None,
            adjust_reason: AdjustReason::Requested,
            iterations: 0,
            adjustments: 0,
            failure_streak: 0,
            final_report: None,
            deadline: started + self.config.time_budget,
        };

        info!(
            request = %request,
            max_iterations = self.config.max_iterations,
            budget_secs = self.config.time_budget.as_secs(),
            "Starting session"
        );
        self.log_event("session_start", json!({ "request": request }));

        let mut state = LoopState::Planning;

        let cause = loop {
            if is_cancelled(&self.cancellation_token) {
                break TerminationCause::Cancelled;
            }
            if Instant::now() >= session.deadline {
                break TerminationCause::TimeBudgetExhausted;
            }

            let transition = match state {
                LoopState::Planning => self.plan(&mut session, progress).await,
                LoopState::Selecting => self.select(&mut session, progress).await,
                LoopState::Executing => self.execute(&mut session, progress).await,
                LoopState::Observing => self.observe(&mut session, progress).await,
                LoopState::Adjusting => self.adjust(&mut session),
                // terminal states are only entered after the loop
                LoopState::Finalizing | LoopState::Done | LoopState::Aborted => {
                    break TerminationCause::Finalized;
                }
            };

            match transition {
                Transition::Next(next) => {
                    debug!(from = %state, to = %next, "State transition");
                    progress.on_state_change(state, next);
                    state = next;
                }
                Transition::Stop(cause) => break cause,
            }
        };

        let final_state = match cause {
            TerminationCause::Aborted { .. } => LoopState::Aborted,
            _ => {
                progress.on_state_change(state, LoopState::Finalizing);
                state = LoopState::Finalizing;
                LoopState::Done
            }
        };
        progress.on_state_change(state, final_state);

        let report = self.finalize(session, cause, final_state, started);
        progress.on_session_end(final_state, report.cause.as_str());
        Ok(report)
    }

    // ==================== States ====================

    async fn plan(&self, session: &mut Session, progress: &dyn LoopProgressNotifier) -> Transition {
        let plan = match session.proposed_plan.take() {
            Some(plan) => plan,
            None => {
                let prompt = self.render(session, PromptTemplate::planning);
                match self.ask("planning", &prompt, session.deadline).await {
                    Ok(text) => match interpret_plan(&text) {
                        Some((plan, method)) => {
                            debug!(method = %method, subtasks = plan.len(), "Plan parsed");
                            plan
                        }
                        None => {
                            warn!("Planner returned no usable plan, using single default subtask");
                            Plan::fallback(&session.request)
                        }
                    },
                    Err(Interrupt::Planner(e)) => {
                        warn!(error = %e, "Planning failed, using single default subtask");
                        Plan::fallback(&session.request)
                    }
                    Err(interrupt) => return Transition::Stop(interrupt.into_cause()),
                }
            }
        };

        info!(task_type = %plan.task_type, subtasks = plan.len(), "Plan accepted");
        self.log_event("plan", json!(plan));
        progress.on_plan(&plan);

        session.plan = plan;
        session.cursor = 0;
        session.completed.clear();
        Transition::Next(LoopState::Selecting)
    }

    async fn select(
        &self,
        session: &mut Session,
        progress: &dyn LoopProgressNotifier,
    ) -> Transition {
        if session.iterations >= self.config.max_iterations {
            warn!(
                iterations = session.iterations,
                "Iteration cap reached, finalizing"
            );
            return Transition::Stop(TerminationCause::IterationCapReached);
        }
        session.iterations += 1;

        if let Some(pending) = session.pending.take() {
            session.selected = Some(pending);
            return Transition::Next(LoopState::Executing);
        }

        self.skip_blocked_subtasks(session);
        let Some(subtask) = session.current_subtask().cloned() else {
            return Transition::Stop(TerminationCause::PlanExhausted);
        };

        let prompt = self.render(session, |ctx| {
            PromptTemplate::selection(ctx, &session.plan, &subtask)
        });
        let interpretation = match self.ask("selection", &prompt, session.deadline).await {
            Ok(text) => {
                let first = interpret(&text);
                if first.confidence < self.config.confidence_floor {
                    self.reprompt(session, &prompt, &text, first, progress).await
                } else {
                    first
                }
            }
            Err(Interrupt::Planner(e)) => {
                warn!(error = %e, "Selection prompt failed");
                Interpretation::empty()
            }
            Err(interrupt) => return Transition::Stop(interrupt.into_cause()),
        };
        self.record_decision(LoopState::Selecting, &interpretation, progress);

        match interpretation.decision {
            Some(Decision::Continue { tool, args }) => {
                let mut merged = subtask.args.clone();
                merged.extend(args);
                session.selected = Some((tool, merged));
                Transition::Next(LoopState::Executing)
            }
            Some(Decision::Finalize { report }) => {
                session.final_report = Some(report).filter(|r| !r.trim().is_empty());
                Transition::Stop(TerminationCause::Finalized)
            }
            Some(Decision::Abort { reason }) => Transition::Stop(TerminationCause::Aborted { reason }),
            Some(Decision::Adjust { plan }) => {
                self.propose(session, plan);
                Transition::Next(LoopState::Adjusting)
            }
            None => match subtask.tool {
                Some(tool) => {
                    debug!(tool = %tool, subtask = %subtask.id, "No decision, using subtask tool hint");
                    session.selected = Some((tool, subtask.args));
                    Transition::Next(LoopState::Executing)
                }
                None => Transition::Stop(TerminationCause::PlannerUnresponsive),
            },
        }
    }

    /// One re-prompt after a low-confidence answer; the better of the two
    /// interpretations wins, ties going to the newer one.
    async fn reprompt(
        &self,
        session: &Session,
        prompt: &str,
        response: &str,
        first: Interpretation,
        progress: &dyn LoopProgressNotifier,
    ) -> Interpretation {
        debug!(
            confidence = first.confidence,
            floor = self.config.confidence_floor,
            "Low-confidence answer, re-prompting"
        );
        progress.on_reprompt(first.confidence);
        self.log_event("reprompt", json!({ "confidence": first.confidence }));

        let retry = PromptTemplate::reprompt(prompt, response);
        match self.ask("reprompt", &retry, session.deadline).await {
            Ok(text) => {
                let second = interpret(&text);
                if second.confidence >= first.confidence {
                    second
                } else {
                    first
                }
            }
            Err(_) => first,
        }
    }

    async fn execute(
        &self,
        session: &mut Session,
        progress: &dyn LoopProgressNotifier,
    ) -> Transition {
        let Some((tool, mut args)) = session.selected.take() else {
            return Transition::Next(LoopState::Selecting);
        };
        if let Some(descriptor) = self.dispatcher.registry().lookup(&tool) {
            resolve_missing_args(descriptor, &mut args, &session.context, &session.request);
        }

        progress.on_tool_call(&tool, &compact_json(&Value::Object(args.clone()), 200));

        let mut cancelled = false;
        let result = {
            let call = self.dispatcher.execute_until(
                &tool,
                &args,
                &mut session.context,
                Some(session.deadline),
            );
            tokio::pin!(call);
            match &self.cancellation_token {
                Some(token) => tokio::select! {
                    result = &mut call => result,
                    _ = token.cancelled() => {
                        info!(tool = %tool, "Cancelled during dispatch, closing transport");
                        cancelled = true;
                        self.dispatcher.transport().close().await;
                        call.await
                    }
                },
                None => call.await,
            }
        };

        progress.on_tool_result(&result);
        if let Some(record) = session.context.last_step() {
            self.log_event(
                "step",
                json!({ "record": record, "envelope": result.to_envelope() }),
            );
        }

        if cancelled {
            return Transition::Stop(TerminationCause::Cancelled);
        }

        match &result.error {
            None => {
                if let (Some(index), Some(payload)) = (result.metadata.step_index, &result.result) {
                    store_observation(&mut session.context, &result.tool_name, index, payload);
                }
                if let Some(subtask) = session.plan.get(session.cursor) {
                    session.completed.insert(subtask.id.clone());
                }
                session.failure_streak = 0;
                session.cursor = (session.cursor + 1).min(session.plan.len());
                Transition::Next(LoopState::Observing)
            }
            Some(error) if error.kind == ErrorKind::ConnectionError => {
                warn!(tool = %result.tool_name, error = %error.message, "Connection lost");
                Transition::Stop(TerminationCause::ConnectionLost {
                    message: error.message.clone(),
                })
            }
            Some(_) => {
                session.failure_streak += 1;
                Transition::Next(LoopState::Observing)
            }
        }
    }

    async fn observe(
        &self,
        session: &mut Session,
        progress: &dyn LoopProgressNotifier,
    ) -> Transition {
        if session.failure_streak >= self.config.max_consecutive_failures {
            info!(
                failures = session.failure_streak,
                "Consecutive failures, re-planning"
            );
            session.adjust_reason = AdjustReason::Failures;
            return Transition::Next(LoopState::Adjusting);
        }

        let remaining = session.remaining_subtasks();
        let prompt = self.render(session, |ctx| PromptTemplate::observation(ctx, remaining));
        let interpretation = match self.ask("observation", &prompt, session.deadline).await {
            Ok(text) => interpret(&text),
            Err(Interrupt::Planner(e)) => {
                warn!(error = %e, "Observation prompt failed");
                Interpretation::empty()
            }
            Err(interrupt) => return Transition::Stop(interrupt.into_cause()),
        };
        self.record_decision(LoopState::Observing, &interpretation, progress);

        match interpretation.decision {
            Some(Decision::Continue { tool, args }) => {
                session.pending = Some((tool, args));
                Transition::Next(LoopState::Selecting)
            }
            Some(Decision::Adjust { plan }) => {
                self.propose(session, plan);
                Transition::Next(LoopState::Adjusting)
            }
            Some(Decision::Abort { reason }) => Transition::Stop(TerminationCause::Aborted { reason }),
            Some(Decision::Finalize { report }) => {
                session.final_report = Some(report).filter(|r| !r.trim().is_empty());
                Transition::Stop(TerminationCause::Finalized)
            }
            None => Transition::Next(LoopState::Selecting),
        }
    }

    fn adjust(&self, session: &mut Session) -> Transition {
        session.adjustments += 1;
        if session.adjustments > self.config.max_adjustments {
            warn!(adjustments = session.adjustments - 1, "Adjustment limit reached");
            return Transition::Stop(match session.adjust_reason {
                AdjustReason::Failures => TerminationCause::RepeatedFailures,
                AdjustReason::Requested => TerminationCause::AdjustmentLimit,
            });
        }
        session.failure_streak = 0;
        session.pending = None;
        Transition::Next(LoopState::Planning)
    }

    // ==================== Helpers ====================

    /// Advance past subtasks whose dependencies have not succeeded.
    fn skip_blocked_subtasks(&self, session: &mut Session) {
        while let Some(subtask) = session.current_subtask() {
            let unmet = session.unmet_dependencies(subtask);
            if unmet.is_empty() {
                return;
            }
            warn!(subtask = %subtask.id, unmet = ?unmet, "Dependencies not satisfied, skipping subtask");
            self.log_event(
                "subtask_skipped",
                json!({ "subtask": subtask.id, "unmet": unmet }),
            );
            session.cursor += 1;
        }
    }

    fn propose(&self, session: &mut Session, subtasks: Vec<Subtask>) {
        session.adjust_reason = AdjustReason::Requested;
        session.proposed_plan = if subtasks.is_empty() {
            None
        } else {
            Some(Plan {
                task_type: session.plan.task_type.clone(),
                subtasks,
            })
        };
    }

    fn finalize(
        &self,
        session: Session,
        cause: TerminationCause,
        final_state: LoopState,
        started: Instant,
    ) -> SessionReport {
        let steps = session.context.ledger().to_vec();
        let evicted = session.context.evicted_steps();
        let (report, report_source) = match session.final_report {
            Some(text) => (text, ReportSource::Planner),
            None => (
                synthesize_report(&session.request, &steps, &cause),
                ReportSource::Synthesized,
            ),
        };

        let report = SessionReport {
            request: session.request,
            plan: session.plan,
            steps,
            cause,
            final_state,
            report,
            report_source,
            iterations: session.iterations,
            adjustments: session.adjustments,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            cause = %report.cause,
            steps = report.steps.len(),
            succeeded = report.success_count(),
            iterations = report.iterations,
            "Session finished"
        );
        self.log_event(
            "session_end",
            json!({
                "cause": report.cause,
                "final_state": report.final_state,
                "steps": report.steps.len(),
                "evicted": evicted,
                "succeeded": report.success_count(),
                "iterations": report.iterations,
                "elapsed_ms": report.elapsed_ms,
            }),
        );
        report
    }

    /// Build a prompt from the registry and the session's recent context.
    fn render(&self, session: &Session, build: impl FnOnce(&PromptContext<'_>) -> String) -> String {
        let tools: Vec<&ToolDescriptor> = self.dispatcher.registry().all().collect();
        let history = session.context.recent_history(self.config.prompt_history);
        let values: Vec<(&str, &Value)> = session.context.values().collect();
        let skip = values.len().saturating_sub(PROMPT_VALUES);
        let ctx = PromptContext {
            request: &session.request,
            tools: &tools,
            history: &history,
            values: &values[skip..],
        };
        build(&ctx)
    }

    /// Ask the planner, bounded by the session deadline and cancellation.
    async fn ask(
        &self,
        stage: &'static str,
        prompt: &str,
        deadline: Instant,
    ) -> Result<String, Interrupt> {
        let call = tokio::time::timeout_at(deadline, self.planner.complete(prompt));
        let outcome = match &self.cancellation_token {
            Some(token) => tokio::select! {
                _ = token.cancelled() => return Err(Interrupt::Cancelled),
                outcome = call => outcome,
            },
            None => call.await,
        };

        match outcome {
            Err(_) => Err(Interrupt::Deadline),
            Ok(Err(e)) => {
                self.log_event("planner_error", json!({ "stage": stage, "error": e.to_string() }));
                Err(Interrupt::Planner(e))
            }
            Ok(Ok(text)) => {
                self.log_event(
                    "planner_response",
                    json!({ "stage": stage, "prompt": prompt, "response": text }),
                );
                Ok(text)
            }
        }
    }

    fn record_decision(
        &self,
        state: LoopState,
        interpretation: &Interpretation,
        progress: &dyn LoopProgressNotifier,
    ) {
        debug!(
            state = %state,
            kind = ?interpretation.kind(),
            method = %interpretation.method,
            confidence = interpretation.confidence,
            "Decision interpreted"
        );
        self.log_event(
            "decision",
            json!({ "state": state, "interpretation": interpretation }),
        );
        progress.on_decision(interpretation);
    }

    fn log_event(&self, event_type: &'static str, payload: Value) {
        self.session_logger.log(SessionEvent::new(event_type, payload));
    }
}

impl Interrupt {
    fn into_cause(self) -> TerminationCause {
        match self {
            Interrupt::Cancelled => TerminationCause::Cancelled,
            Interrupt::Deadline => TerminationCause::TimeBudgetExhausted,
            Interrupt::Planner(_) => TerminationCause::PlannerUnresponsive,
        }
    }
}

/// Fill required parameters the planner left out: an exact context key,
/// the first element of a plural key (`addresses` for `address`), the
/// store's wider lookup, then a value named in the request text.
fn resolve_missing_args(
    descriptor: &ToolDescriptor,
    args: &mut Map<String, Value>,
    context: &ContextStore,
    request: &str,
) {
    for param in descriptor.required_parameters() {
        if args.get(&param.name).is_some_and(|v| !v.is_null()) {
            continue;
        }
        let found = context
            .get_value(&param.name)
            .filter(|v| !v.is_null())
            .cloned()
            .or_else(|| first_of_plural(context, &param.name))
            .or_else(|| context.resolve_value(&param.name))
            .or_else(|| extract_from_request(request, &param.name));
        if let Some(value) = found {
            debug!(tool = %descriptor.name, parameter = %param.name, "Resolved missing argument");
            args.insert(param.name.clone(), value);
        }
    }
}

fn first_of_plural(context: &ContextStore, name: &str) -> Option<Value> {
    [format!("{}s", name), format!("{}es", name)]
        .iter()
        .filter_map(|key| context.get_value(key))
        .find_map(|value| value.as_array().and_then(|items| items.first()).cloned())
}

/// Store a successful payload as `{tool}_{index}`, `last_result`, and each
/// top-level field of an object payload.
fn store_observation(context: &mut ContextStore, tool: &str, index: usize, payload: &Value) {
    context.set_value(format!("{}_{}", tool, index), payload.clone());
    context.set_value("last_result", payload.clone());
    if let Value::Object(fields) = payload {
        for (key, value) in fields {
            if key != "success" && !value.is_null() {
                context.set_value(key.clone(), value.clone());
            }
        }
    }
}
