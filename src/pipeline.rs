//! Reconciliation pipeline: mapping, formulas, indexing, diff

use crate::config::ReconConfig;
use crate::diff::{CellComparator, DiffEngine, DiffResult};
use crate::error::{ReconError, Side};
use crate::formula;
use crate::index::KeyedRows;
use crate::model::Dataset;

/// Everything a caller needs to render one reconciliation run: the diff, the
/// two post-formula datasets for previewing, and the column-scoped formula
/// errors collected along the way.
#[derive(Debug)]
pub struct ReconReport {
    pub diff: DiffResult,
    pub left: Dataset,
    pub right: Dataset,
    /// Key columns the run was aligned on, for renderers that need to pick
    /// orphan rows back out of the datasets
    pub key_columns: Vec<String>,
    pub formula_errors: Vec<ReconError>,
}

/// Run the full reconciliation over two materialized datasets.
///
/// Stages run in order: column mapping, per-column formulas, key indexing,
/// diff. Each stage returns new data; the inputs are never mutated.
/// `MappingConflict`, `KeyColumnMissing`, and `DuplicateKey` abort the run;
/// formula failures are column-scoped and reported in the result.
pub fn reconcile(
    left: &Dataset,
    right: &Dataset,
    config: &ReconConfig,
) -> Result<ReconReport, ReconError> {
    let (left, right) = config.mapping.apply(left, right)?;
    log::debug!(
        "mapped columns: left={:?} right={:?}",
        left.column_names(),
        right.column_names()
    );

    let (left, mut formula_errors) = formula::apply_all(&left, &config.formulas, Side::Left);
    let (right, right_errors) = formula::apply_all(&right, &config.formulas, Side::Right);
    formula_errors.extend(right_errors);

    let left_keyed = KeyedRows::build(&left, &config.key_spec, Side::Left)?;
    let right_keyed = KeyedRows::build(&right, &config.key_spec, Side::Right)?;

    let comparator = CellComparator::new(
        config.ignore_case,
        config.ignore_whitespace,
        config.numeric_tolerance,
    );
    let engine = DiffEngine::new(comparator, &config.excluded_columns);
    let diff = engine.diff(&left_keyed, &right_keyed);

    if diff.empty_overlap {
        log::info!("no common, non-excluded columns to compare");
    }
    log::debug!(
        "diff: {} shared keys, {} differing cells, {} left-only, {} right-only",
        diff.stats.shared_keys,
        diff.stats.cells_differing,
        diff.stats.left_only,
        diff.stats.right_only
    );

    Ok(ReconReport {
        diff,
        left,
        right,
        key_columns: config.key_spec.columns().to_vec(),
        formula_errors,
    })
}
