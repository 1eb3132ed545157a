//! Cell-level comparison logic

use crate::model::CellValue;

/// Cell comparator with configurable relaxations.
///
/// The base rule is scalar equality with documented null handling: null
/// equals null, null never equals a non-null value.
pub struct CellComparator {
    ignore_case: bool,
    ignore_whitespace: bool,
    numeric_tolerance: Option<f64>,
}

impl CellComparator {
    /// Create a new cell comparator
    pub fn new(ignore_case: bool, ignore_whitespace: bool, numeric_tolerance: Option<f64>) -> Self {
        Self {
            ignore_case,
            ignore_whitespace,
            numeric_tolerance,
        }
    }

    /// Compare two cell values for equality
    pub fn equal(&self, a: &CellValue, b: &CellValue) -> bool {
        if let Some(tolerance) = self.numeric_tolerance {
            if a.equals_with_tolerance(b, tolerance) {
                return true;
            }
        }

        if self.ignore_case && a.equals_ignore_case(b) {
            return true;
        }

        if self.ignore_whitespace && a.equals_ignore_whitespace(b) {
            return true;
        }

        a == b
    }
}

impl Default for CellComparator {
    fn default() -> Self {
        Self::new(false, false, None)
    }
}
