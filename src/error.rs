//! Error taxonomy for the reconciliation pipeline

use thiserror::Error;

/// Which source a side-scoped error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "source 1"),
            Side::Right => write!(f, "source 2"),
        }
    }
}

/// Typed failures surfaced by the reconciliation stages.
///
/// Every variant carries the offending key/column/value context needed to fix
/// the input without re-running the whole pipeline blind.
#[derive(Debug, Error)]
pub enum ReconError {
    /// The column pairing table is not bijective on its declared entries
    #[error("column mapping conflict: {detail}")]
    MappingConflict { detail: String },

    /// A declared key column is absent from one dataset
    #[error("key column '{column}' missing in {side}")]
    KeyColumnMissing { column: String, side: Side },

    /// Two rows share an identical key tuple; row identity is ambiguous
    #[error("duplicate key '{key}' in {side} (rows {first_row} and {second_row})")]
    DuplicateKey {
        key: String,
        side: Side,
        first_row: usize,
        second_row: usize,
    },

    /// Formula evaluation failed; scoped to one column of one dataset
    #[error("formula error in column '{column}' ({side}, row {row}): {message}")]
    FormulaError {
        column: String,
        side: Side,
        row: usize,
        message: String,
    },

    /// Source kind has no installed loader or executor
    #[error("unsupported source kind '{kind}'")]
    UnsupportedSourceKind { kind: String },

    /// Load, connect, or query failure for one source
    #[error("failed to load {side}")]
    SourceLoad {
        side: Side,
        #[source]
        source: anyhow::Error,
    },
}

impl ReconError {
    /// The column a column-scoped error refers to, if any
    pub fn column(&self) -> Option<&str> {
        match self {
            ReconError::KeyColumnMissing { column, .. }
            | ReconError::FormulaError { column, .. } => Some(column),
            _ => None,
        }
    }
}
