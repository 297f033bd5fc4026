//! Column metadata and the closed set of formatting classes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Formatting class of a column.
///
/// Every declared type name resolves to exactly one class through
/// [`ColumnType::from_declared`]; names outside the table are rejected there
/// so the formatter never sees an unknown type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// TINYINT .. BIGINT
    Integer,
    /// FLOAT, DOUBLE, REAL
    Float,
    /// DECIMAL, DEC, NUMERIC
    Decimal,
    /// DATE
    Date,
    /// DATETIME, TIMESTAMP
    DateTime,
    /// TIME
    Time,
    /// YEAR
    Year,
    /// CHAR, VARCHAR and the TEXT family
    Text,
    /// BIT, BINARY, VARBINARY and the BLOB family
    Binary,
    /// ENUM, SET, JSON
    Verbatim,
    /// BOOL, BOOLEAN
    Bool,
}

impl ColumnType {
    /// Resolve a declared database type name.
    ///
    /// Returns `None` for unsupported types (spatial types, VECTOR, ...).
    pub fn from_declared(declared: &str) -> Option<Self> {
        let normalized = normalize_type_name(declared);
        let class = match normalized.as_str() {
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" => {
                ColumnType::Integer
            }
            "FLOAT" | "DOUBLE" | "REAL" => ColumnType::Float,
            "DECIMAL" | "DEC" | "NUMERIC" => ColumnType::Decimal,
            "DATE" => ColumnType::Date,
            "DATETIME" | "TIMESTAMP" => ColumnType::DateTime,
            "TIME" => ColumnType::Time,
            "YEAR" => ColumnType::Year,
            "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" => {
                ColumnType::Text
            }
            "BIT" | "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB"
            | "LONGBLOB" => ColumnType::Binary,
            "ENUM" | "SET" | "JSON" => ColumnType::Verbatim,
            "BOOL" | "BOOLEAN" => ColumnType::Bool,
            _ => return None,
        };
        Some(class)
    }

    /// Name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Decimal => "decimal",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
            ColumnType::Time => "time",
            ColumnType::Year => "year",
            ColumnType::Text => "text",
            ColumnType::Binary => "binary",
            ColumnType::Verbatim => "enum/set/json",
            ColumnType::Bool => "bool",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Normalize a declared type name: uppercase, `UNSIGNED` and whitespace removed.
///
/// Length/precision suffixes such as `(10,2)` are cut as well so that a full
/// column definition (`int(10) unsigned`) resolves like its bare name.
pub fn normalize_type_name(declared: &str) -> String {
    let upper = declared.to_uppercase().replace("UNSIGNED", "").replace("ZEROFILL", "");
    let base = match upper.find('(') {
        Some(idx) => &upper[..idx],
        None => upper.as_str(),
    };
    base.chars().filter(|c| !c.is_whitespace()).collect()
}

/// A column as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    /// Column name.
    pub name: String,
    /// Declared type name as the catalog reports it.
    pub declared_type: String,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }
}
