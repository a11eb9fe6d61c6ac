//! Console output formatter for session reports

use crate::output::formatter::OutputFormatter;
use ceagent_application::{ReportSource, SessionReport};
use ceagent_domain::{StepSummary, ToolRegistry};
use colored::Colorize;

/// Formats session reports for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete report
    pub fn format(report: &SessionReport) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("CE Agent Session"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Request:".cyan().bold(),
            report.request
        ));
        output.push_str(&format!("{} {}\n", "Outcome:".cyan().bold(), Self::outcome(report)));
        output.push_str(&format!(
            "{} {} iterations, {} adjustments, {:.1}s\n",
            "Effort:".cyan().bold(),
            report.iterations,
            report.adjustments,
            report.elapsed_ms as f64 / 1000.0
        ));

        if !report.plan.subtasks.is_empty() {
            output.push_str(&Self::section_header("Plan"));
            for (i, subtask) in report.plan.subtasks.iter().enumerate() {
                let tool = subtask
                    .tool
                    .as_deref()
                    .map(|t| format!(" [{}]", t).dimmed().to_string())
                    .unwrap_or_default();
                output.push_str(&format!("  {}. {}{}\n", i + 1, subtask.description, tool));
            }
        }

        output.push_str(&Self::section_header("Steps"));
        if report.steps.is_empty() {
            output.push_str(&format!("  {}\n", "(no tools were called)".dimmed()));
        }
        let terminating = report.terminating_step().map(|s| s.index);
        for step in &report.steps {
            output.push_str(&Self::step_line(step, terminating == Some(step.index)));
            output.push('\n');
        }
        output.push_str(&format!(
            "\n  {} succeeded, {} failed\n",
            report.success_count().to_string().green(),
            report.failure_count().to_string().red()
        ));

        let title = match report.report_source {
            ReportSource::Planner => "Report",
            ReportSource::Synthesized => "Report (synthesized from steps)",
        };
        output.push_str(&Self::section_header(title));
        output.push('\n');
        output.push_str(&Self::indent(report.report.trim_end(), "  "));
        output.push('\n');

        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(report: &SessionReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format outcome and counts only
    pub fn format_summary(report: &SessionReport) -> String {
        format!(
            "{} {}\n{} {} steps ({} succeeded, {} failed)\n",
            "Outcome:".bold(),
            Self::outcome(report),
            "Steps:".bold(),
            report.steps.len(),
            report.success_count(),
            report.failure_count()
        )
    }

    /// List registered tools grouped by category
    pub fn format_tool_list(registry: &ToolRegistry) -> String {
        let mut tools: Vec<_> = registry.all().collect();
        tools.sort_by(|a, b| {
            (a.category.as_str(), a.name.as_str()).cmp(&(b.category.as_str(), b.name.as_str()))
        });

        let mut output = String::new();
        let mut category = None;
        for tool in tools {
            if category != Some(tool.category) {
                category = Some(tool.category);
                output.push_str(&format!("{}\n", tool.category.as_str().cyan().bold()));
            }
            output.push_str(&format!("  {}", tool.signature()));
            if !tool.description.is_empty() {
                output.push_str(&format!("\n      {}", tool.description.dimmed()));
            }
            output.push('\n');
        }
        output.push_str(&format!("\n{} tools\n", registry.len()));
        output
    }

    fn outcome(report: &SessionReport) -> String {
        let cause = report.cause.to_string();
        if report.is_partial() {
            format!("{} {}", cause.yellow().bold(), "(partial)".yellow())
        } else if report.failure_count() == 0 {
            cause.green().bold().to_string()
        } else {
            cause.bold().to_string()
        }
    }

    fn step_line(step: &StepSummary, terminating: bool) -> String {
        let mut line = if step.is_success() {
            format!("  {} [{}] {}", "✓".green(), step.index, step.tool_name)
        } else {
            let kind = step
                .error_kind
                .map(|k| k.to_string())
                .unwrap_or_else(|| "UnknownError".to_string());
            let mut line = format!(
                "  {} [{}] {} {}",
                "✗".red(),
                step.index,
                step.tool_name,
                kind.red()
            );
            if let Some(message) = &step.message {
                line.push_str(&format!(": {}", message));
            }
            line
        };
        if terminating {
            line.push_str(&format!(" {}", "(terminating)".red().bold()));
        }
        line
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, report: &SessionReport) -> String {
        Self::format(report)
    }

    fn format_json(&self, report: &SessionReport) -> String {
        Self::format_json(report)
    }

    fn format_summary(&self, report: &SessionReport) -> String {
        Self::format_summary(report)
    }
}
