//! Output formatter trait

use ceagent_application::SessionReport;
use ceagent_domain::OutputFormat;

/// Trait for rendering session reports
pub trait OutputFormatter {
    /// Every step, the terminating cause and the planner's report
    fn format(&self, report: &SessionReport) -> String;

    /// Pretty-printed JSON
    fn format_json(&self, report: &SessionReport) -> String;

    /// Outcome and counts only
    fn format_summary(&self, report: &SessionReport) -> String;

    /// Dispatch on a configured [`OutputFormat`].
    fn render(&self, report: &SessionReport, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => self.format(report),
            OutputFormat::Summary => self.format_summary(report),
            OutputFormat::Json => self.format_json(report),
        }
    }
}
