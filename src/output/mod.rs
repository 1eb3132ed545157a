//! Output formatting for reconciliation reports

mod json;
mod terminal;

use std::io::Write;

use anyhow::Result;

use crate::config::OutputFormat;
use crate::pipeline::ReconReport;

pub use json::JsonOutput;
pub use terminal::TerminalOutput;

/// Trait for report renderers
pub trait OutputFormatter {
    /// Render a reconciliation report to a writer
    fn render(
        &self,
        report: &ReconReport,
        left_label: &str,
        right_label: &str,
        writer: &mut dyn Write,
    ) -> Result<()>;
}

/// Factory for creating output formatters
pub struct OutputFactory;

impl OutputFactory {
    /// Create an output formatter based on format type
    pub fn create(format: OutputFormat) -> Box<dyn OutputFormatter> {
        match format {
            OutputFormat::Terminal => Box::new(TerminalOutput::new()),
            OutputFormat::Json => Box::new(JsonOutput::new()),
        }
    }
}

/// Render a report to stdout
pub fn render_to_stdout(
    report: &ReconReport,
    left_label: &str,
    right_label: &str,
    format: OutputFormat,
) -> Result<()> {
    let formatter = OutputFactory::create(format);
    let mut stdout = std::io::stdout();
    formatter.render(report, left_label, right_label, &mut stdout)
}
