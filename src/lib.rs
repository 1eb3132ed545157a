//! tablerecon - key-based reconciliation of tabular data
//!
//! Compares two tabular datasets from heterogeneous sources (CSV files,
//! relational queries) by composite key, reporting per-key per-column cell
//! differences and rows present on only one side. Optional per-column
//! formulas are applied to both sides before comparison, evaluated in a
//! sandboxed expression context.

pub mod config;
pub mod diff;
pub mod error;
pub mod formula;
pub mod index;
pub mod loader;
pub mod mapper;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod settings;

pub use config::ReconConfig;
pub use diff::DiffResult;
pub use error::ReconError;
pub use model::Dataset;
pub use pipeline::{reconcile, ReconReport};
pub use settings::SettingsBundle;
