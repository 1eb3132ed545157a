//! Core data model: cell values, datasets, and composite keys

mod dataset;
mod key;
mod value;

pub use dataset::{Column, Dataset};
pub use key::{KeySpec, KeyTuple};
pub use value::{CellType, CellValue};
