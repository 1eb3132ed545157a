//! JSON output format

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use crate::model::KeyTuple;
use crate::pipeline::ReconReport;

use super::OutputFormatter;

/// Machine-readable JSON renderer
pub struct JsonOutput {
    pretty: bool,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonCellDifference {
    key: Vec<serde_json::Value>,
    column: String,
    source1: serde_json::Value,
    source2: serde_json::Value,
}

#[derive(Serialize)]
struct JsonStats {
    shared_keys: usize,
    keys_differing: usize,
    cells_differing: usize,
    left_only: usize,
    right_only: usize,
    left_row_count: usize,
    right_row_count: usize,
}

#[derive(Serialize)]
struct JsonReport {
    source1: String,
    source2: String,
    compared_columns: Vec<String>,
    empty_overlap: bool,
    cell_differences: Vec<JsonCellDifference>,
    left_only_keys: Vec<Vec<serde_json::Value>>,
    right_only_keys: Vec<Vec<serde_json::Value>>,
    formula_errors: Vec<String>,
    stats: JsonStats,
}

fn key_to_json(key: &KeyTuple) -> Vec<serde_json::Value> {
    key.values().iter().map(|v| v.to_json()).collect()
}

impl OutputFormatter for JsonOutput {
    fn render(
        &self,
        report: &ReconReport,
        left_label: &str,
        right_label: &str,
        writer: &mut dyn Write,
    ) -> Result<()> {
        let stats = &report.diff.stats;
        let output = JsonReport {
            source1: left_label.to_string(),
            source2: right_label.to_string(),
            compared_columns: report.diff.compared_columns.clone(),
            empty_overlap: report.diff.empty_overlap,
            cell_differences: report
                .diff
                .cell_differences
                .iter()
                .map(|d| JsonCellDifference {
                    key: key_to_json(&d.key),
                    column: d.column.clone(),
                    source1: d.left.to_json(),
                    source2: d.right.to_json(),
                })
                .collect(),
            left_only_keys: report.diff.left_only.iter().map(key_to_json).collect(),
            right_only_keys: report.diff.right_only.iter().map(key_to_json).collect(),
            formula_errors: report
                .formula_errors
                .iter()
                .map(|e| e.to_string())
                .collect(),
            stats: JsonStats {
                shared_keys: stats.shared_keys,
                keys_differing: stats.keys_differing,
                cells_differing: stats.cells_differing,
                left_only: stats.left_only,
                right_only: stats.right_only,
                left_row_count: stats.left_row_count,
                right_row_count: stats.right_row_count,
            },
        };

        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &output)?;
        } else {
            serde_json::to_writer(&mut *writer, &output)?;
        }
        writeln!(writer)?;

        Ok(())
    }
}
