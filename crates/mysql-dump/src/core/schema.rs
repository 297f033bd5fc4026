//! Catalog objects the dump walks over.

use serde::{Deserialize, Serialize};

/// Kind of a catalog object, as far as the dump cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableKind {
    /// Base table: structure, rows and triggers are exported.
    Table,
    /// View: only the structure is exported.
    View,
}

impl TableKind {
    /// Classify an `information_schema.TABLES.TABLE_TYPE` value.
    ///
    /// Other kinds (`SYSTEM VIEW`, `SEQUENCE`, ...) yield `None` and are
    /// skipped by the dump.
    pub fn from_catalog(table_type: &str) -> Option<Self> {
        match table_type {
            "BASE TABLE" => Some(TableKind::Table),
            "VIEW" => Some(TableKind::View),
            _ => None,
        }
    }

    /// Whether rows of this object belong in the dump.
    pub fn has_rows(&self) -> bool {
        matches!(self, TableKind::Table)
    }
}

/// A table or view selected for export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub kind: TableKind,
}

/// A raw `information_schema.TABLES` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub table_type: String,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, table_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_type: table_type.into(),
        }
    }

    /// Resolve to a descriptor, or `None` for kinds the dump does not handle.
    pub fn descriptor(&self) -> Option<TableDescriptor> {
        TableKind::from_catalog(&self.table_type).map(|kind| TableDescriptor {
            name: self.name.clone(),
            kind,
        })
    }
}

/// A trigger definition, exported verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRecord {
    /// Trigger name.
    pub name: String,
    /// INSERT, UPDATE or DELETE.
    pub event: String,
    /// BEFORE or AFTER.
    pub timing: String,
    /// Trigger body.
    pub statement: String,
    /// Owning table.
    pub table: String,
    /// Database of the owning table.
    pub database: String,
}
