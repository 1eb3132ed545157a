//! Settings Serializer: persists and restores the full reconciliation
//! configuration as a transportable JSON bundle
//!
//! The wire format keeps the original field names: `source1_type`,
//! `key_columns` as a comma-joined string, `formulas`, `excluded_columns`,
//! `column_mapping`, and optional `sourceN_csv_data` holding base64-encoded
//! raw file bytes. Every field tolerates absence on import.

use std::str::FromStr;

use anyhow::{Context, Result};
use base64::Engine;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ReconError, Side};
use crate::formula::FormulaSet;
use crate::loader::{ConnectionDescriptor, SourceDescriptor, SourceKind};
use crate::mapper::ColumnMapping;
use crate::model::KeySpec;

/// Relational credentials as persisted in a bundle.
/// The source kind lives in the sibling `sourceN_type` field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbCredentials {
    pub host: String,
    pub port: String,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub query: String,
}

impl DbCredentials {
    fn to_descriptor(&self, kind: SourceKind) -> ConnectionDescriptor {
        ConnectionDescriptor {
            kind,
            host: self.host.clone(),
            port: self.port.clone(),
            database: self.dbname.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            query: self.query.clone(),
        }
    }
}

impl From<&ConnectionDescriptor> for DbCredentials {
    fn from(conn: &ConnectionDescriptor) -> Self {
        Self {
            host: conn.host.clone(),
            port: conn.port.clone(),
            dbname: conn.database.clone(),
            user: conn.user.clone(),
            password: conn.password.clone(),
            query: conn.query.clone(),
        }
    }
}

/// The full set of user-declared reconciliation parameters, plus optionally
/// inlined raw bytes for file-based sources.
///
/// Consumed wholesale on import; at the UI level imported values act as input
/// defaults that explicit arguments may override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsBundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source1_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source2_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source1_creds: Option<DbCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source2_creds: Option<DbCredentials>,
    /// Comma-joined key column names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_columns: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub formulas: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excluded_columns: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub column_mapping: IndexMap<String, String>,
    /// base64-encoded raw bytes of a file-based source 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source1_csv_data: Option<String>,
    /// base64-encoded raw bytes of a file-based source 2
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source2_csv_data: Option<String>,
}

impl SettingsBundle {
    /// Parse a bundle from JSON bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("parsing settings bundle")
    }

    /// Serialize the bundle to pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing settings bundle")
    }

    /// Inline a file-based source's raw bytes
    pub fn set_csv_data(&mut self, side: Side, bytes: &[u8]) {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        match side {
            Side::Left => self.source1_csv_data = Some(encoded),
            Side::Right => self.source2_csv_data = Some(encoded),
        }
    }

    /// Decode a side's inlined bytes, if present
    pub fn csv_data(&self, side: Side) -> Option<Result<Vec<u8>>> {
        let encoded = match side {
            Side::Left => self.source1_csv_data.as_deref(),
            Side::Right => self.source2_csv_data.as_deref(),
        }?;
        Some(
            base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .context("decoding inlined CSV data"),
        )
    }

    /// The declared key spec, if any
    pub fn key_spec(&self) -> Option<KeySpec> {
        self.key_columns.as_deref().and_then(KeySpec::parse)
    }

    /// The declared column mapping, validated for bijectivity
    pub fn mapping(&self) -> Result<ColumnMapping, ReconError> {
        ColumnMapping::from_pairs(
            self.column_mapping
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        )
    }

    /// The declared formula bindings
    pub fn formula_set(&self) -> FormulaSet {
        FormulaSet::from_pairs(self.formulas.iter().map(|(k, v)| (k.clone(), v.clone())))
    }

    /// Reconstruct one side's source descriptor from the bundle, if the
    /// bundle carries enough to describe it.
    pub fn source_descriptor(&self, side: Side) -> Result<Option<SourceDescriptor>> {
        let (kind_field, creds) = match side {
            Side::Left => (&self.source1_type, &self.source1_creds),
            Side::Right => (&self.source2_type, &self.source2_creds),
        };

        let kind = match kind_field.as_deref() {
            Some(raw) => SourceKind::from_str(raw).map_err(anyhow::Error::from)?,
            None if self.csv_data(side).is_some() => SourceKind::Csv,
            None => return Ok(None),
        };

        match kind {
            SourceKind::Csv => match self.csv_data(side) {
                Some(bytes) => Ok(Some(SourceDescriptor::Csv {
                    label: format!("{side} (inlined)"),
                    bytes: bytes?,
                })),
                None => Ok(None),
            },
            relational => Ok(creds
                .as_ref()
                .map(|c| SourceDescriptor::Database(c.to_descriptor(relational)))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_tolerates_absent_fields() {
        let bundle = SettingsBundle::from_slice(b"{}").unwrap();
        assert_eq!(bundle, SettingsBundle::default());
        assert!(bundle.key_spec().is_none());
        assert!(bundle.formula_set().is_empty());
    }

    #[test]
    fn export_omits_default_fields() {
        let bundle = SettingsBundle {
            key_columns: Some("id".to_string()),
            ..SettingsBundle::default()
        };
        let json = bundle.to_json_string().unwrap();
        assert!(json.contains("key_columns"));
        assert!(!json.contains("formulas"));
        assert!(!json.contains("source1_creds"));
    }

    #[test]
    fn round_trip_with_inlined_csv() {
        let csv = b"id,val\n1,10\n";
        let mut bundle = SettingsBundle {
            source1_type: Some("CSV".to_string()),
            source2_type: Some("PostgreSQL".to_string()),
            source2_creds: Some(DbCredentials {
                host: "db".into(),
                port: "5432".into(),
                dbname: "sales".into(),
                user: "u".into(),
                password: "p".into(),
                query: "select 1".into(),
            }),
            key_columns: Some("id,region".to_string()),
            excluded_columns: vec!["audit_ts".to_string()],
            ..SettingsBundle::default()
        };
        bundle.formulas.insert("val".into(), "value * 2".into());
        bundle.column_mapping.insert("val".into(), "amount".into());
        bundle.set_csv_data(Side::Left, csv);

        let json = bundle.to_json_string().unwrap();
        let restored = SettingsBundle::from_slice(json.as_bytes()).unwrap();
        assert_eq!(restored, bundle);
        assert_eq!(restored.csv_data(Side::Left).unwrap().unwrap(), csv);
        assert_eq!(
            restored.key_spec().unwrap().columns(),
            &["id".to_string(), "region".to_string()]
        );
    }

    #[test]
    fn descriptor_reconstruction() {
        let mut bundle = SettingsBundle {
            source1_type: Some("CSV".to_string()),
            source2_type: Some("MySQL".to_string()),
            source2_creds: Some(DbCredentials {
                host: "h".into(),
                port: "3306".into(),
                dbname: "d".into(),
                user: "u".into(),
                password: "p".into(),
                query: "t".into(),
            }),
            ..SettingsBundle::default()
        };
        bundle.set_csv_data(Side::Left, b"a\n1\n");

        let left = bundle.source_descriptor(Side::Left).unwrap().unwrap();
        assert!(matches!(left, SourceDescriptor::Csv { .. }));
        let right = bundle.source_descriptor(Side::Right).unwrap().unwrap();
        match right {
            SourceDescriptor::Database(conn) => assert_eq!(conn.kind, SourceKind::MySql),
            other => panic!("unexpected descriptor: {other:?}"),
        }
    }

    #[test]
    fn conflicting_mapping_is_rejected_on_use() {
        let mut bundle = SettingsBundle::default();
        bundle.column_mapping.insert("a".into(), "x".into());
        bundle.column_mapping.insert("b".into(), "x".into());
        assert!(bundle.mapping().is_err());
    }
}
