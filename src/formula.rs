//! Formula Engine: sandboxed per-column value transformation
//!
//! Expressions are interpreted over a restricted context holding only the
//! bound variable `value` and a fixed set of registered string helpers, plus
//! the evaluator's built-in arithmetic/comparison/boolean operators. No file
//! system, network, process, or ambient state is reachable from a formula.

use std::borrow::Cow;

use evalexpr::{
    eval_with_context, ContextWithMutableFunctions, ContextWithMutableVariables, EvalexprError,
    Function, HashMapContext, Value as EvalValue,
};
use indexmap::IndexMap;

use crate::error::{ReconError, Side};
use crate::model::{CellValue, Dataset};

/// Per-column expression bindings, insertion-ordered.
/// Each expression has exactly one free variable, `value`, bound to the
/// column's current value on each row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormulaSet {
    formulas: IndexMap<String, String>,
}

impl FormulaSet {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            formulas: pairs.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, column: String, expression: String) {
        self.formulas.insert(column, expression);
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.formulas.iter()
    }
}

fn register_string_functions(context: &mut HashMapContext) -> Result<(), EvalexprError> {
    context.set_function(
        "lowercase".into(),
        Function::new(|argument| {
            let value = expect_string(argument, "lowercase")?;
            Ok(EvalValue::String(value.to_lowercase()))
        }),
    )?;

    context.set_function(
        "uppercase".into(),
        Function::new(|argument| {
            let value = expect_string(argument, "uppercase")?;
            Ok(EvalValue::String(value.to_uppercase()))
        }),
    )?;

    context.set_function(
        "trim".into(),
        Function::new(|argument| {
            let value = expect_string(argument, "trim")?;
            Ok(EvalValue::String(value.trim().to_string()))
        }),
    )?;

    context.set_function(
        "substring".into(),
        Function::new(|argument| {
            let args = match argument {
                EvalValue::Tuple(values) if values.len() == 3 => values.clone(),
                _ => {
                    return Err(EvalexprError::CustomMessage(
                        "substring expects (value, start, length)".to_string(),
                    ))
                }
            };
            let value = expect_string(&args[0], "substring")?.to_string();
            let start = expect_int(&args[1], "start")?.max(0) as usize;
            let length = expect_int(&args[2], "length")?;
            if length <= 0 {
                return Ok(EvalValue::String(String::new()));
            }
            let result: String = value.chars().skip(start).take(length as usize).collect();
            Ok(EvalValue::String(result))
        }),
    )?;

    Ok(())
}

fn expect_string(value: &EvalValue, name: &str) -> Result<String, EvalexprError> {
    if let EvalValue::String(s) = value {
        Ok(s.clone())
    } else {
        Err(EvalexprError::CustomMessage(format!(
            "{name} expects a string argument"
        )))
    }
}

fn expect_int(value: &EvalValue, name: &str) -> Result<i64, EvalexprError> {
    match value {
        EvalValue::Int(i) => Ok(*i),
        EvalValue::Float(f) => Ok(*f as i64),
        _ => Err(EvalexprError::CustomMessage(format!(
            "expected integer for {name}"
        ))),
    }
}

fn cell_to_eval(cell: &CellValue) -> EvalValue {
    match cell {
        CellValue::Null => EvalValue::Empty,
        CellValue::Bool(b) => EvalValue::Boolean(*b),
        CellValue::Int(i) => EvalValue::Int(*i),
        CellValue::Float(f) => EvalValue::Float(*f),
        CellValue::String(s) => EvalValue::String(s.to_string()),
        CellValue::Date(d) => EvalValue::String(d.to_string()),
        CellValue::DateTime(dt) => EvalValue::String(dt.to_string()),
    }
}

fn eval_to_cell(value: EvalValue) -> Result<CellValue, EvalexprError> {
    match value {
        EvalValue::Empty => Ok(CellValue::Null),
        EvalValue::Boolean(b) => Ok(CellValue::Bool(b)),
        EvalValue::Int(i) => Ok(CellValue::Int(i)),
        EvalValue::Float(f) => Ok(CellValue::Float(f)),
        EvalValue::String(s) => Ok(CellValue::String(Cow::Owned(s))),
        EvalValue::Tuple(_) => Err(EvalexprError::CustomMessage(
            "formula produced a tuple, expected a scalar".to_string(),
        )),
    }
}

fn build_context(cell: &CellValue) -> Result<HashMapContext, EvalexprError> {
    let mut context = HashMapContext::new();
    register_string_functions(&mut context)?;
    context.set_value("value".into(), cell_to_eval(cell))?;
    Ok(context)
}

/// Apply one formula to one column, evaluating the expression once per row.
///
/// Failure on any row rejects the whole column's transformation; the caller
/// keeps the original, untransformed column for reporting.
pub fn apply_column(
    dataset: &Dataset,
    column: &str,
    expression: &str,
    side: Side,
) -> Result<Dataset, ReconError> {
    let formula_error = |row: usize, message: String| ReconError::FormulaError {
        column: column.to_string(),
        side,
        row,
        message,
    };

    let index = dataset
        .column_index(column)
        .ok_or_else(|| formula_error(0, "column not found".to_string()))?;

    let mut transformed = Vec::with_capacity(dataset.row_count());
    for (row_num, row) in dataset.rows.iter().enumerate() {
        let cell = &row[index];
        let context =
            build_context(cell).map_err(|e| formula_error(row_num + 1, e.to_string()))?;
        let result = eval_with_context(expression, &context)
            .map_err(|e| formula_error(row_num + 1, e.to_string()))?;
        let cell = eval_to_cell(result).map_err(|e| formula_error(row_num + 1, e.to_string()))?;
        transformed.push(cell);
    }

    Ok(dataset.replace_column(index, transformed))
}

/// Apply every formula in the set to one dataset.
///
/// Failures are column-scoped: a failing formula leaves its column
/// untransformed and is reported alongside the others' results, never
/// aborting the run.
pub fn apply_all(dataset: &Dataset, formulas: &FormulaSet, side: Side) -> (Dataset, Vec<ReconError>) {
    let mut current = dataset.clone();
    let mut errors = Vec::new();

    for (column, expression) in formulas.iter() {
        match apply_column(&current, column, expression, side) {
            Ok(next) => current = next,
            Err(err) => {
                log::warn!("{err}");
                errors.push(err);
            }
        }
    }

    (current, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellType, Column};

    fn dataset() -> Dataset {
        let mut ds = Dataset::new(vec![Column::new("id", 0), Column::new("val", 1)]);
        ds.add_row(vec![CellValue::Int(1), CellValue::Int(10)]);
        ds.add_row(vec![CellValue::Int(2), CellValue::Int(20)]);
        ds.infer_column_types();
        ds
    }

    #[test]
    fn arithmetic_over_bound_value() {
        let out = apply_column(&dataset(), "val", "value * 2", Side::Left).unwrap();
        assert_eq!(out.rows[0][1], CellValue::Int(20));
        assert_eq!(out.rows[1][1], CellValue::Int(40));
    }

    #[test]
    fn identity_expression_is_a_no_op() {
        let ds = dataset();
        let out = apply_column(&ds, "val", "value", Side::Left).unwrap();
        assert_eq!(out.rows, ds.rows);
        assert_eq!(out.columns[1].inferred_type, CellType::Int);
    }

    #[test]
    fn string_helpers_are_available() {
        let mut ds = Dataset::new(vec![Column::new("name", 0)]);
        ds.add_row(vec![CellValue::from("  Alice ")]);
        let out = apply_column(&ds, "name", "lowercase(trim(value))", Side::Left).unwrap();
        assert_eq!(out.rows[0][0], CellValue::from("alice"));
    }

    #[test]
    fn failure_on_any_row_rejects_the_column() {
        let mut ds = Dataset::new(vec![Column::new("v", 0)]);
        ds.add_row(vec![CellValue::Int(1)]);
        ds.add_row(vec![CellValue::from("oops")]);
        // row 2 is a string; multiplying it by an int fails
        let err = apply_column(&ds, "v", "value * 2", Side::Left).unwrap_err();
        match err {
            ReconError::FormulaError { column, row, .. } => {
                assert_eq!(column, "v");
                assert_eq!(row, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn undefined_identifiers_fail_instead_of_escaping_the_sandbox() {
        let err = apply_column(&dataset(), "val", "open_file(value)", Side::Left).unwrap_err();
        assert!(matches!(err, ReconError::FormulaError { .. }));
    }

    #[test]
    fn missing_column_is_a_formula_error() {
        let err = apply_column(&dataset(), "nope", "value", Side::Left).unwrap_err();
        assert_eq!(err.column(), Some("nope"));
    }

    #[test]
    fn apply_all_is_column_scoped() {
        let mut ds = Dataset::new(vec![Column::new("a", 0), Column::new("b", 1)]);
        ds.add_row(vec![CellValue::Int(1), CellValue::from("x")]);
        let formulas = FormulaSet::from_pairs([
            ("a".to_string(), "value + 1".to_string()),
            ("b".to_string(), "value * 2".to_string()),
        ]);
        let (out, errors) = apply_all(&ds, &formulas, Side::Right);
        // "a" applied, "b" rejected but left intact
        assert_eq!(out.rows[0][0], CellValue::Int(2));
        assert_eq!(out.rows[0][1], CellValue::from("x"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].column(), Some("b"));
    }
}
