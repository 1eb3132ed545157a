//! Delimited-text parsing with cell type inference

use std::borrow::Cow;

use anyhow::{bail, Context, Result};
use rustc_hash::FxHashSet;

use crate::model::{CellValue, Column, Dataset};

/// Parser for delimited-text sources
pub struct CsvLoader;

impl CsvLoader {
    pub fn new() -> Self {
        Self
    }

    /// Parse a dataset from raw bytes (a file's contents or an inlined
    /// settings payload). The first record is the header row.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Dataset> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers = csv_reader
            .headers()
            .context("Failed to read CSV headers")?
            .clone();

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for name in headers.iter() {
            if !seen.insert(name) {
                bail!("duplicate column name '{}' in header", name);
            }
        }

        let columns: Vec<Column> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| Column::new(name.to_string(), i))
            .collect();

        let mut dataset = Dataset::new(columns);

        for (record_num, result) in csv_reader.records().enumerate() {
            let record = result
                .with_context(|| format!("Failed to read CSV row {}", record_num + 2))?; // +2 for 1-indexing and header

            let cells: Vec<CellValue> = record.iter().map(parse_cell_value).collect();
            dataset.add_row(cells);
        }

        dataset.infer_column_types();
        Ok(dataset)
    }
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a string value into a CellValue with type inference
fn parse_cell_value(s: &str) -> CellValue {
    let trimmed = s.trim();

    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") || trimmed == "NA" {
        return CellValue::Null;
    }

    if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("yes") {
        return CellValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") || trimmed.eq_ignore_ascii_case("no") {
        return CellValue::Bool(false);
    }

    if let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Int(i);
    }

    if let Ok(f) = trimmed.parse::<f64>() {
        return CellValue::Float(f);
    }

    if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return CellValue::Date(date);
    }

    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return CellValue::DateTime(dt);
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return CellValue::DateTime(dt);
    }

    CellValue::String(Cow::Owned(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellType;

    #[test]
    fn parse_cell_value_inference() {
        assert_eq!(parse_cell_value(""), CellValue::Null);
        assert_eq!(parse_cell_value("null"), CellValue::Null);
        assert_eq!(parse_cell_value("true"), CellValue::Bool(true));
        assert_eq!(parse_cell_value("false"), CellValue::Bool(false));
        assert_eq!(parse_cell_value("42"), CellValue::Int(42));
        assert_eq!(parse_cell_value("3.14"), CellValue::Float(3.14));
        assert_eq!(parse_cell_value("hello"), CellValue::from("hello"));
        assert_eq!(
            parse_cell_value("2024-01-15"),
            CellValue::Date(chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
    }

    #[test]
    fn parses_headers_and_rows() {
        let ds = CsvLoader::new()
            .parse_bytes(b"id,val\n1,10\n2,20\n")
            .unwrap();
        assert_eq!(ds.column_names(), vec!["id", "val"]);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.columns[1].inferred_type, CellType::Int);
    }

    #[test]
    fn short_rows_pad_with_nulls() {
        let ds = CsvLoader::new().parse_bytes(b"a,b,c\n1,2\n").unwrap();
        assert_eq!(ds.rows[0][2], CellValue::Null);
    }

    #[test]
    fn duplicate_headers_rejected() {
        let err = CsvLoader::new().parse_bytes(b"id,id\n1,2\n").unwrap_err();
        assert!(err.to_string().contains("duplicate column name"));
    }
}
