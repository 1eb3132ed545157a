//! Key Indexer: builds sorted, uniqueness-checked keyed views of a dataset

use std::collections::BTreeMap;

use crate::error::{ReconError, Side};
use crate::model::{CellValue, Column, Dataset, KeySpec, KeyTuple};

/// A dataset re-expressed as a sorted mapping from composite key tuple to its
/// non-key column values.
///
/// Keys are unique per dataset; duplicate keys are a fatal condition detected
/// at construction, never silently merged. Iteration order is the key tuples'
/// total order (lexicographic over the ordered key columns, nulls first).
#[derive(Debug, Clone)]
pub struct KeyedRows {
    /// Non-key column metadata in declared order
    pub columns: Vec<Column>,
    /// Sorted key tuple -> non-key cell values
    pub rows: BTreeMap<KeyTuple, Vec<CellValue>>,
}

impl KeyedRows {
    /// Build a keyed view of the dataset.
    ///
    /// Fails with `KeyColumnMissing` when a key column is absent, and with
    /// `DuplicateKey` when two rows share an identical key tuple.
    pub fn build(dataset: &Dataset, key_spec: &KeySpec, side: Side) -> Result<Self, ReconError> {
        let mut key_indices = Vec::with_capacity(key_spec.columns().len());
        for name in key_spec.columns() {
            let index = dataset.column_index(name).ok_or_else(|| {
                ReconError::KeyColumnMissing {
                    column: name.clone(),
                    side,
                }
            })?;
            key_indices.push(index);
        }

        let mut columns = Vec::new();
        let mut value_indices = Vec::new();
        for (pos, col) in dataset.columns.iter().enumerate() {
            if !key_indices.contains(&pos) {
                columns.push(col.clone());
                value_indices.push(pos);
            }
        }

        let mut rows: BTreeMap<KeyTuple, Vec<CellValue>> = BTreeMap::new();
        let mut first_seen: BTreeMap<KeyTuple, usize> = BTreeMap::new();

        for (row_num, row) in dataset.rows.iter().enumerate() {
            let key = KeyTuple::new(key_indices.iter().map(|&i| row[i].clone()).collect());
            if let Some(&first_row) = first_seen.get(&key) {
                return Err(ReconError::DuplicateKey {
                    key: key.to_string(),
                    side,
                    first_row: first_row + 1,
                    second_row: row_num + 1,
                });
            }
            first_seen.insert(key.clone(), row_num);
            let values = value_indices.iter().map(|&i| row[i].clone()).collect();
            rows.insert(key, values);
        }

        Ok(Self { columns, rows })
    }

    /// Non-key column names in declared order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Position of a non-key column within the stored value rows
    pub fn value_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Sorted keys
    pub fn keys(&self) -> impl Iterator<Item = &KeyTuple> {
        self.rows.keys()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(rows: &[(&str, i64)]) -> Dataset {
        let mut ds = Dataset::new(vec![Column::new("id", 0), Column::new("val", 1)]);
        for (id, val) in rows {
            ds.add_row(vec![CellValue::from(*id), CellValue::Int(*val)]);
        }
        ds
    }

    #[test]
    fn keys_come_out_sorted() {
        let ds = dataset(&[("b", 2), ("a", 1), ("c", 3)]);
        let spec = KeySpec::parse("id").unwrap();
        let keyed = KeyedRows::build(&ds, &spec, Side::Left).unwrap();
        let keys: Vec<String> = keyed.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn indexing_is_idempotent() {
        let ds = dataset(&[("b", 2), ("a", 1)]);
        let spec = KeySpec::parse("id").unwrap();
        let first = KeyedRows::build(&ds, &spec, Side::Left).unwrap();
        let second = KeyedRows::build(&ds, &spec, Side::Left).unwrap();
        let order1: Vec<_> = first.keys().cloned().collect();
        let order2: Vec<_> = second.keys().cloned().collect();
        assert_eq!(order1, order2);
    }

    #[test]
    fn missing_key_column_is_reported_with_side() {
        let ds = dataset(&[("a", 1)]);
        let spec = KeySpec::parse("missing").unwrap();
        let err = KeyedRows::build(&ds, &spec, Side::Right).unwrap_err();
        match err {
            ReconError::KeyColumnMissing { column, side } => {
                assert_eq!(column, "missing");
                assert_eq!(side, Side::Right);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_keys_are_fatal() {
        let ds = dataset(&[("K1", 1), ("K2", 2), ("K1", 3)]);
        let spec = KeySpec::parse("id").unwrap();
        let err = KeyedRows::build(&ds, &spec, Side::Left).unwrap_err();
        match err {
            ReconError::DuplicateKey {
                key,
                first_row,
                second_row,
                ..
            } => {
                assert_eq!(key, "K1");
                assert_eq!(first_row, 1);
                assert_eq!(second_row, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn null_keys_sort_first() {
        let mut ds = Dataset::new(vec![Column::new("id", 0), Column::new("val", 1)]);
        ds.add_row(vec![CellValue::from("z"), CellValue::Int(1)]);
        ds.add_row(vec![CellValue::Null, CellValue::Int(2)]);
        let spec = KeySpec::parse("id").unwrap();
        let keyed = KeyedRows::build(&ds, &spec, Side::Left).unwrap();
        let first = keyed.keys().next().unwrap();
        assert!(first.values()[0].is_null());
    }

    #[test]
    fn composite_keys_use_all_declared_columns() {
        let mut ds = Dataset::new(vec![
            Column::new("region", 0),
            Column::new("id", 1),
            Column::new("val", 2),
        ]);
        ds.add_row(vec![CellValue::from("eu"), CellValue::Int(1), CellValue::Int(10)]);
        ds.add_row(vec![CellValue::from("us"), CellValue::Int(1), CellValue::Int(20)]);
        let spec = KeySpec::parse("region,id").unwrap();
        let keyed = KeyedRows::build(&ds, &spec, Side::Left).unwrap();
        assert_eq!(keyed.len(), 2);
        assert_eq!(keyed.column_names(), vec!["val"]);
    }
}
