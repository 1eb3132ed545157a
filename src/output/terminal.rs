//! Terminal output for reconciliation reports

use std::io::Write;

use anyhow::Result;
use rustc_hash::FxHashMap;
use tabled::builder::Builder;
use tabled::settings::Style;
use termcolor::ColorChoice;

use crate::model::{Dataset, KeyTuple};
use crate::pipeline::ReconReport;

use super::OutputFormatter;

/// Human-readable terminal renderer
pub struct TerminalOutput {
    #[allow(dead_code)]
    color_choice: ColorChoice,
}

impl TerminalOutput {
    pub fn new() -> Self {
        Self {
            color_choice: ColorChoice::Auto,
        }
    }

    pub fn with_color_choice(color_choice: ColorChoice) -> Self {
        Self { color_choice }
    }

    fn write_header(
        &self,
        writer: &mut dyn Write,
        left_label: &str,
        right_label: &str,
    ) -> Result<()> {
        writeln!(
            writer,
            "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
        )?;
        writeln!(writer, " tablerecon: {} ⇄ {}", left_label, right_label)?;
        writeln!(
            writer,
            "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
        )?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_columns_preview(&self, report: &ReconReport, writer: &mut dyn Write) -> Result<()> {
        writeln!(writer, "Source 1 columns: {}", report.left.column_names().join(", "))?;
        writeln!(writer, "Source 2 columns: {}", report.right.column_names().join(", "))?;
        writeln!(writer, "Compared columns: {}", report.diff.compared_columns.join(", "))?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_summary(&self, report: &ReconReport, writer: &mut dyn Write) -> Result<()> {
        let stats = &report.diff.stats;
        writeln!(
            writer,
            "Summary: {} shared keys ({} differing, {} cells), {} only in source 1, {} only in source 2",
            stats.shared_keys,
            stats.keys_differing,
            stats.cells_differing,
            stats.left_only,
            stats.right_only
        )?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_formula_errors(&self, report: &ReconReport, writer: &mut dyn Write) -> Result<()> {
        if report.formula_errors.is_empty() {
            return Ok(());
        }
        writeln!(writer, "Formula errors (columns left untransformed):")?;
        for error in &report.formula_errors {
            writeln!(writer, "  ⚠ {}", error)?;
        }
        writeln!(writer)?;
        Ok(())
    }

    fn write_cell_differences(&self, report: &ReconReport, writer: &mut dyn Write) -> Result<()> {
        if report.diff.cell_differences.is_empty() {
            return Ok(());
        }

        writeln!(writer, "Differences (source 1 → source 2):")?;
        let mut current_key: Option<&KeyTuple> = None;
        for diff in &report.diff.cell_differences {
            if current_key != Some(&diff.key) {
                writeln!(writer, "  {}:", diff.key)?;
                current_key = Some(&diff.key);
            }
            writeln!(
                writer,
                "    {}: {} → {}",
                diff.column,
                diff.left.display(),
                diff.right.display()
            )?;
        }
        writeln!(writer)?;
        Ok(())
    }

    fn write_orphan_rows(
        &self,
        title: &str,
        keys: &[KeyTuple],
        dataset: &Dataset,
        key_columns: &[String],
        writer: &mut dyn Write,
    ) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        writeln!(writer, "{}:", title)?;

        let key_indices: Vec<usize> = key_columns
            .iter()
            .filter_map(|name| dataset.column_index(name))
            .collect();
        let mut by_key: FxHashMap<KeyTuple, usize> = FxHashMap::default();
        for (idx, row) in dataset.rows.iter().enumerate() {
            let key = KeyTuple::new(key_indices.iter().map(|&i| row[i].clone()).collect());
            by_key.insert(key, idx);
        }

        let mut builder = Builder::default();
        builder.push_record(dataset.column_names());
        for key in keys {
            if let Some(&idx) = by_key.get(key) {
                builder.push_record(
                    dataset.rows[idx]
                        .iter()
                        .map(|c| c.display().into_owned())
                        .collect::<Vec<_>>(),
                );
            }
        }
        let table = builder.build().with(Style::sharp()).to_string();
        writeln!(writer, "{}", table)?;
        writeln!(writer)?;
        Ok(())
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TerminalOutput {
    fn render(
        &self,
        report: &ReconReport,
        left_label: &str,
        right_label: &str,
        writer: &mut dyn Write,
    ) -> Result<()> {
        self.write_header(writer, left_label, right_label)?;
        self.write_columns_preview(report, writer)?;
        self.write_formula_errors(report, writer)?;

        if report.diff.empty_overlap {
            writeln!(writer, "No common, non-excluded columns to compare.")?;
            writeln!(writer)?;
        }

        if !report.diff.has_differences() {
            writeln!(writer, "No differences found in shared keys and columns.")?;
            return Ok(());
        }

        self.write_summary(report, writer)?;
        self.write_cell_differences(report, writer)?;
        self.write_orphan_rows(
            "Rows in source 1 but missing in source 2",
            &report.diff.left_only,
            &report.left,
            &report.key_columns,
            writer,
        )?;
        self.write_orphan_rows(
            "Rows in source 2 but missing in source 1",
            &report.diff.right_only,
            &report.right,
            &report.key_columns,
            writer,
        )?;

        Ok(())
    }
}
