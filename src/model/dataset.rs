//! In-memory tabular dataset

use indexmap::IndexMap;

use super::value::{CellType, CellValue};

/// Column metadata
#[derive(Debug, Clone)]
pub struct Column {
    /// Column name (from header or query result)
    pub name: String,
    /// Column index (0-based position)
    pub index: usize,
    /// Inferred type from data
    pub inferred_type: CellType,
}

impl Column {
    /// Create a new column with name and index
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
            inferred_type: CellType::Null,
        }
    }
}

/// An in-memory table of named columns with equal row counts.
///
/// Pipeline stages treat datasets as immutable inputs: mapping, formula
/// application, and indexing all return new data rather than mutating in
/// place.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Column definitions in declared order
    pub columns: Vec<Column>,
    /// Row-major cells; every row holds exactly `columns.len()` values
    pub rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Create a new empty dataset with column definitions
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Add a row, padding with nulls if it has fewer cells than columns
    pub fn add_row(&mut self, mut cells: Vec<CellValue>) {
        if cells.len() < self.columns.len() {
            cells.resize(self.columns.len(), CellValue::Null);
        }
        self.rows.push(cells);
    }

    /// Get column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Get column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in declared order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Return a copy with columns renamed per the given table.
    /// Columns absent from the table keep their name.
    pub fn rename_columns(&self, renames: &IndexMap<String, String>) -> Dataset {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let name = renames.get(&c.name).cloned().unwrap_or_else(|| c.name.clone());
                Column {
                    name,
                    index: c.index,
                    inferred_type: c.inferred_type,
                }
            })
            .collect();
        Dataset {
            columns,
            rows: self.rows.clone(),
        }
    }

    /// Return a copy with one column's values replaced.
    /// The replacement must have the same cardinality as the dataset.
    pub fn replace_column(&self, index: usize, values: Vec<CellValue>) -> Dataset {
        debug_assert_eq!(values.len(), self.row_count());
        let mut out = self.clone();
        for (row, value) in out.rows.iter_mut().zip(values) {
            row[index] = value;
        }
        out.reinfer_column_type(index);
        out
    }

    /// Re-infer a single column's type by widening over its values
    fn reinfer_column_type(&mut self, index: usize) {
        let mut inferred = CellType::Null;
        for row in &self.rows {
            if let Some(cell) = row.get(index) {
                inferred = inferred.widen(cell.cell_type());
            }
        }
        if let Some(col) = self.columns.get_mut(index) {
            col.inferred_type = inferred;
        }
    }

    /// Infer all column types from data
    pub fn infer_column_types(&mut self) {
        for idx in 0..self.column_count() {
            self.reinfer_column_type(idx);
        }
    }
}
