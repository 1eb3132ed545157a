//! Composite key handling

use serde::{Deserialize, Serialize};

use super::value::CellValue;

/// Ordered, non-empty list of key column names.
/// Identical spelling is required in both datasets post-mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpec {
    columns: Vec<String>,
}

impl KeySpec {
    /// Build a key spec from column names; returns None when empty
    pub fn new(columns: Vec<String>) -> Option<Self> {
        if columns.is_empty() {
            None
        } else {
            Some(Self { columns })
        }
    }

    /// Parse a comma-separated key column list, trimming whitespace
    pub fn parse(input: &str) -> Option<Self> {
        let columns: Vec<String> = input
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self::new(columns)
    }

    /// Key column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Render as the comma-joined form used by settings bundles
    pub fn to_joined(&self) -> String {
        self.columns.join(",")
    }
}

/// Composite key values for one row, ordered per the key spec.
///
/// The derived `Ord` is lexicographic over the key columns using the cell
/// values' total order, so nulls sort before all non-null components.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyTuple(Vec<CellValue>);

impl KeyTuple {
    pub fn new(values: Vec<CellValue>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[CellValue] {
        &self.0
    }
}

impl std::fmt::Display for KeyTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|v| v.display().into_owned())
            .collect::<Vec<_>>()
            .join("|");
        write!(f, "{}", joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_drops_empty_segments() {
        let spec = KeySpec::parse(" id , region ,").unwrap();
        assert_eq!(spec.columns(), &["id".to_string(), "region".to_string()]);
        assert!(KeySpec::parse("  ").is_none());
    }

    #[test]
    fn tuples_order_lexicographically_with_nulls_first() {
        let a = KeyTuple::new(vec![CellValue::Null, CellValue::Int(9)]);
        let b = KeyTuple::new(vec![CellValue::Int(1), CellValue::Int(0)]);
        let c = KeyTuple::new(vec![CellValue::Int(1), CellValue::Int(2)]);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn display_joins_components() {
        let key = KeyTuple::new(vec![CellValue::from("K1"), CellValue::Int(3)]);
        assert_eq!(key.to_string(), "K1|3");
    }
}
