//! Progress reporting for reasoning loop execution

use ceagent_application::LoopProgressNotifier;
use ceagent_domain::{Interpretation, LoopState, Plan, ToolResult, truncate};
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Longest argument or error text shown on a progress line
const DETAIL_WIDTH: usize = 80;

/// Reports loop progress with a spinner per session
pub struct ProgressReporter {
    multi: MultiProgress,
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn with_spinner(&self, f: impl FnOnce(&ProgressBar)) {
        let Ok(mut guard) = self.spinner.lock() else {
            return;
        };
        let pb = guard.get_or_insert_with(|| {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        f(pb);
    }

    fn println(&self, line: String) {
        let _ = self.multi.println(line);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopProgressNotifier for ProgressReporter {
    fn on_state_change(&self, _from: LoopState, to: LoopState) {
        self.with_spinner(|pb| pb.set_prefix(to.display_name().to_string()));
    }

    fn on_plan(&self, plan: &Plan) {
        self.println(plan_line(plan));
    }

    fn on_decision(&self, interpretation: &Interpretation) {
        if let Some(thought) = &interpretation.thought {
            self.with_spinner(|pb| pb.set_message(truncate(thought, DETAIL_WIDTH)));
        }
    }

    fn on_reprompt(&self, confidence: f64) {
        self.println(format!(
            "  {} low confidence ({:.2}), asking again",
            "?".yellow(),
            confidence
        ));
    }

    fn on_tool_call(&self, tool_name: &str, args: &str) {
        self.with_spinner(|pb| {
            pb.set_message(format!("{} {}", tool_name, truncate(args, DETAIL_WIDTH)))
        });
    }

    fn on_tool_result(&self, result: &ToolResult) {
        self.println(result_line(result));
    }

    fn on_session_end(&self, state: LoopState, cause: &str) {
        if let Ok(mut guard) = self.spinner.lock()
            && let Some(pb) = guard.take()
        {
            let mark = if state == LoopState::Done {
                state.display_name().green()
            } else {
                state.display_name().red()
            };
            pb.finish_with_message(format!("{} ({})", mark, cause));
        }
    }
}

/// Simple line-based progress (no spinner), written to stderr
pub struct SimpleProgress;

impl LoopProgressNotifier for SimpleProgress {
    fn on_state_change(&self, _from: LoopState, to: LoopState) {
        if matches!(to, LoopState::Planning | LoopState::Adjusting | LoopState::Finalizing) {
            eprintln!("{} {}", "->".cyan(), to.display_name().bold());
        }
    }

    fn on_plan(&self, plan: &Plan) {
        eprintln!("{}", plan_line(plan));
    }

    fn on_reprompt(&self, confidence: f64) {
        eprintln!("  {} low confidence ({:.2}), asking again", "?".yellow(), confidence);
    }

    fn on_tool_result(&self, result: &ToolResult) {
        eprintln!("{}", result_line(result));
    }

    fn on_session_end(&self, state: LoopState, cause: &str) {
        eprintln!("{} {} ({})", "->".cyan(), state.display_name().bold(), cause);
    }
}

fn plan_line(plan: &Plan) -> String {
    format!(
        "  {} plan {} with {} subtask(s)",
        "*".cyan(),
        plan.task_type,
        plan.subtasks.len()
    )
}

fn result_line(result: &ToolResult) -> String {
    let duration = result
        .metadata
        .duration_ms
        .map(|ms| format!(" {}ms", ms))
        .unwrap_or_default();
    match result.error() {
        None => format!("  {} {}{}", "v".green(), result.tool_name, duration.dimmed()),
        Some(error) => format!(
            "  {} {} {}: {}{}",
            "x".red(),
            result.tool_name,
            error.kind.to_string().red(),
            truncate(&error.message, DETAIL_WIDTH),
            duration.dimmed()
        ),
    }
}
