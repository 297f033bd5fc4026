//! Core types shared by the dump and restore sides.
//!
//! - [`value`]: raw driver values
//! - [`column`]: column metadata and the closed set of formatting classes
//! - [`schema`]: tables, views and triggers
//! - [`identifier`]: identifier validation and quoting

pub mod column;
pub mod identifier;
pub mod schema;
pub mod value;

pub use column::{ColumnMeta, ColumnType};
pub use schema::{CatalogEntry, TableDescriptor, TableKind, TriggerRecord};
pub use value::SqlValue;
