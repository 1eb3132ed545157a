//! Diff engine: aligns two keyed row sets and reports differences

pub mod cell_diff;

use rustc_hash::FxHashSet;

use crate::index::KeyedRows;
use crate::model::{CellValue, KeyTuple};

pub use cell_diff::CellComparator;

/// One mismatching cell for a shared key
#[derive(Debug, Clone, PartialEq)]
pub struct CellDifference {
    /// Composite key of the row
    pub key: KeyTuple,
    /// Column name
    pub column: String,
    /// Value on source 1
    pub left: CellValue,
    /// Value on source 2
    pub right: CellValue,
}

/// Statistics about a reconciliation run
#[derive(Debug, Default, Clone)]
pub struct DiffStats {
    pub shared_keys: usize,
    pub keys_differing: usize,
    pub cells_differing: usize,
    pub left_only: usize,
    pub right_only: usize,
    pub left_row_count: usize,
    pub right_row_count: usize,
}

impl DiffStats {
    /// Check if there are any differences
    pub fn has_differences(&self) -> bool {
        self.cells_differing > 0 || self.left_only > 0 || self.right_only > 0
    }
}

/// Result of reconciling two keyed row sets.
///
/// Computed fresh on every run; never mutated afterwards.
#[derive(Debug, Default, Clone)]
pub struct DiffResult {
    /// Mismatching cells, grouped by key in sorted key order, columns in
    /// declared order
    pub cell_differences: Vec<CellDifference>,
    /// Keys present only in source 1, sorted
    pub left_only: Vec<KeyTuple>,
    /// Keys present only in source 2, sorted
    pub right_only: Vec<KeyTuple>,
    /// Columns that were actually compared, in source 1 declared order
    pub compared_columns: Vec<String>,
    /// Set when no common, non-excluded columns existed; informational
    pub empty_overlap: bool,
    /// Statistics
    pub stats: DiffStats,
}

impl DiffResult {
    /// Check if there are any differences
    pub fn has_differences(&self) -> bool {
        self.stats.has_differences()
    }
}

/// Diff engine over column-aligned, key-indexed datasets
pub struct DiffEngine {
    comparator: CellComparator,
    excluded_columns: FxHashSet<String>,
}

impl DiffEngine {
    /// Create a new diff engine with an exclusion set
    pub fn new(comparator: CellComparator, excluded_columns: &[String]) -> Self {
        Self {
            comparator,
            excluded_columns: excluded_columns.iter().cloned().collect(),
        }
    }

    /// Compare two keyed row sets.
    ///
    /// Compared columns are the intersection of both sides' non-key columns
    /// minus the exclusion set; columns present on only one side are never
    /// compared and never reported. An empty compared-column set is a valid,
    /// reportable state, not a fault.
    pub fn diff(&self, left: &KeyedRows, right: &KeyedRows) -> DiffResult {
        let mut result = DiffResult {
            stats: DiffStats {
                left_row_count: left.len(),
                right_row_count: right.len(),
                ..DiffStats::default()
            },
            ..DiffResult::default()
        };

        let right_names: FxHashSet<String> = right.column_names().into_iter().collect();
        let compared: Vec<(String, usize, usize)> = left
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                right_names.contains(&c.name) && !self.excluded_columns.contains(&c.name)
            })
            .filter_map(|(left_idx, c)| {
                right
                    .value_index(&c.name)
                    .map(|right_idx| (c.name.clone(), left_idx, right_idx))
            })
            .collect();

        result.compared_columns = compared.iter().map(|(name, _, _)| name.clone()).collect();
        result.empty_overlap = compared.is_empty();

        for (key, left_values) in &left.rows {
            match right.rows.get(key) {
                Some(right_values) => {
                    result.stats.shared_keys += 1;
                    let mut row_differs = false;
                    for (name, left_idx, right_idx) in &compared {
                        let a = &left_values[*left_idx];
                        let b = &right_values[*right_idx];
                        if !self.comparator.equal(a, b) {
                            row_differs = true;
                            result.cell_differences.push(CellDifference {
                                key: key.clone(),
                                column: name.clone(),
                                left: a.clone(),
                                right: b.clone(),
                            });
                        }
                    }
                    if row_differs {
                        result.stats.keys_differing += 1;
                    }
                }
                None => result.left_only.push(key.clone()),
            }
        }

        for key in right.keys() {
            if !left.rows.contains_key(key) {
                result.right_only.push(key.clone());
            }
        }

        result.stats.cells_differing = result.cell_differences.len();
        result.stats.left_only = result.left_only.len();
        result.stats.right_only = result.right_only.len();

        result
    }
}
