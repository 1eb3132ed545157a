//! Configuration for reconciliation runs

use crate::formula::FormulaSet;
use crate::mapper::ColumnMapping;
use crate::model::KeySpec;

/// Output format for reconciliation reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" => Ok(OutputFormat::Terminal),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Explicit, immutable inputs for one reconciliation run.
///
/// The engine takes these plus the two datasets and returns an explicit
/// report; there is no hidden state threading between stages.
#[derive(Debug, Clone)]
pub struct ReconConfig {
    /// Ordered key columns identifying rows
    pub key_spec: KeySpec,
    /// Declared column pairing between the sources
    pub mapping: ColumnMapping,
    /// Per-column expressions applied to both sides pre-comparison
    pub formulas: FormulaSet,
    /// Columns excluded from comparison
    pub excluded_columns: Vec<String>,
    /// Ignore case when comparing string values
    pub ignore_case: bool,
    /// Ignore leading/trailing whitespace in string values
    pub ignore_whitespace: bool,
    /// Tolerance for numeric comparisons
    pub numeric_tolerance: Option<f64>,
}

impl ReconConfig {
    /// Create a config with a key spec and defaults for everything else
    pub fn new(key_spec: KeySpec) -> Self {
        Self {
            key_spec,
            mapping: ColumnMapping::default(),
            formulas: FormulaSet::default(),
            excluded_columns: Vec::new(),
            ignore_case: false,
            ignore_whitespace: false,
            numeric_tolerance: None,
        }
    }

    /// Set the column mapping
    pub fn with_mapping(mut self, mapping: ColumnMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Set the formula bindings
    pub fn with_formulas(mut self, formulas: FormulaSet) -> Self {
        self.formulas = formulas;
        self
    }

    /// Set columns to exclude from comparison
    pub fn with_excluded_columns(mut self, columns: Vec<String>) -> Self {
        self.excluded_columns = columns;
        self
    }

    /// Enable case-insensitive comparison
    pub fn with_ignore_case(mut self, ignore: bool) -> Self {
        self.ignore_case = ignore;
        self
    }

    /// Enable whitespace-insensitive comparison
    pub fn with_ignore_whitespace(mut self, ignore: bool) -> Self {
        self.ignore_whitespace = ignore;
        self
    }

    /// Set numeric tolerance for float comparisons
    pub fn with_numeric_tolerance(mut self, tolerance: f64) -> Self {
        self.numeric_tolerance = Some(tolerance);
        self
    }
}
