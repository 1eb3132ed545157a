//! Column Mapper: aligns logically equivalent columns across the two sources

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::error::ReconError;
use crate::model::Dataset;

/// Declared pairing of Source-1 column names to Source-2 column names.
///
/// Bijective on the declared subset: construction rejects a repeated name on
/// either side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    pairs: IndexMap<String, String>,
}

impl ColumnMapping {
    /// Build a mapping from (source1, source2) name pairs
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ReconError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut mapping = Self::default();
        for (source1, source2) in pairs {
            mapping.insert(source1, source2)?;
        }
        Ok(mapping)
    }

    /// Declare one pairing; fails if either side is already mapped
    pub fn insert(&mut self, source1: String, source2: String) -> Result<(), ReconError> {
        if self.pairs.contains_key(&source1) {
            return Err(ReconError::MappingConflict {
                detail: format!("source 1 column '{}' is mapped more than once", source1),
            });
        }
        if self.pairs.values().any(|v| v == &source2) {
            return Err(ReconError::MappingConflict {
                detail: format!("source 2 column '{}' is mapped more than once", source2),
            });
        }
        self.pairs.insert(source1, source2);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Declared pairs in insertion order
    pub fn pairs(&self) -> impl Iterator<Item = (&String, &String)> {
        self.pairs.iter()
    }

    /// Rename matched Source-2 columns to their Source-1 counterpart so both
    /// datasets expose the agreed common name. Unmapped columns are left
    /// untouched; the inputs are not mutated.
    pub fn apply(&self, left: &Dataset, right: &Dataset) -> Result<(Dataset, Dataset), ReconError> {
        if self.pairs.is_empty() {
            return Ok((left.clone(), right.clone()));
        }

        // source2 name -> source1 name, restricted to columns actually present
        let mut renames: IndexMap<String, String> = IndexMap::new();
        for (source1, source2) in &self.pairs {
            if right.column_index(source2).is_some() {
                renames.insert(source2.clone(), source1.clone());
            }
        }

        // A rename that lands on a name already present on the right would
        // produce duplicate column names there.
        let targets: FxHashSet<&String> = renames.values().collect();
        for col in &right.columns {
            if !renames.contains_key(&col.name) && targets.contains(&col.name) {
                return Err(ReconError::MappingConflict {
                    detail: format!(
                        "renaming onto '{}' collides with an existing source 2 column",
                        col.name
                    ),
                });
            }
        }

        Ok((left.clone(), right.rename_columns(&renames)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellValue, Column};

    fn dataset(names: &[&str]) -> Dataset {
        let columns = names
            .iter()
            .enumerate()
            .map(|(i, n)| Column::new(*n, i))
            .collect();
        let mut ds = Dataset::new(columns);
        ds.add_row(names.iter().map(|_| CellValue::Int(1)).collect());
        ds
    }

    #[test]
    fn renames_source2_onto_source1_name() {
        let left = dataset(&["id", "amount"]);
        let right = dataset(&["id", "amt"]);
        let mapping =
            ColumnMapping::from_pairs([("amount".to_string(), "amt".to_string())]).unwrap();

        let (l, r) = mapping.apply(&left, &right).unwrap();
        assert_eq!(l.column_names(), vec!["id", "amount"]);
        assert_eq!(r.column_names(), vec!["id", "amount"]);
        // originals untouched
        assert_eq!(right.column_names(), vec!["id", "amt"]);
    }

    #[test]
    fn repeated_source1_name_conflicts() {
        let err = ColumnMapping::from_pairs([
            ("a".to_string(), "x".to_string()),
            ("a".to_string(), "y".to_string()),
        ])
        .unwrap_err();
        assert!(matches!(err, ReconError::MappingConflict { .. }));
    }

    #[test]
    fn repeated_source2_name_conflicts() {
        let err = ColumnMapping::from_pairs([
            ("a".to_string(), "x".to_string()),
            ("b".to_string(), "x".to_string()),
        ])
        .unwrap_err();
        assert!(matches!(err, ReconError::MappingConflict { .. }));
    }

    #[test]
    fn rename_collision_with_existing_column_conflicts() {
        let left = dataset(&["id", "amount"]);
        // right already has an "amount" column next to the one being renamed
        let right = dataset(&["id", "amt", "amount"]);
        let mapping =
            ColumnMapping::from_pairs([("amount".to_string(), "amt".to_string())]).unwrap();
        let err = mapping.apply(&left, &right).unwrap_err();
        assert!(matches!(err, ReconError::MappingConflict { .. }));
    }

    #[test]
    fn unmapped_columns_untouched() {
        let left = dataset(&["id", "a"]);
        let right = dataset(&["id", "b", "extra"]);
        let mapping = ColumnMapping::from_pairs([("a".to_string(), "b".to_string())]).unwrap();
        let (_, r) = mapping.apply(&left, &right).unwrap();
        assert_eq!(r.column_names(), vec!["id", "a", "extra"]);
    }
}
