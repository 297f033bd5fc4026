//! SQL literal codec.
//!
//! [`format_value`] turns a raw driver value into SQL literal text according
//! to the column's [`ColumnType`]; [`literal`] reads such text back.
//!
//! | class      | output                                   |
//! |------------|------------------------------------------|
//! | NULL       | `NULL` (any class)                       |
//! | integer    | decimal digits, driver text verbatim     |
//! | float      | driver text verbatim, else shortest form |
//! | decimal    | driver text verbatim                     |
//! | date       | `'YYYY-MM-DD'`                           |
//! | datetime   | `'YYYY-MM-DD HH:MM:SS[.ffffff]'`         |
//! | time       | `'<driver text>'`                        |
//! | year       | `<driver text>`                          |
//! | text       | escaped and single-quoted                |
//! | binary     | `0x` + uppercase hex, `X''` when empty   |
//! | enum/set/json | single-quoted, not escaped            |
//! | bool       | `true` / `false`                         |

pub mod literal;

use std::fmt::Write as _;

use chrono::{NaiveDate, NaiveDateTime};

use crate::core::column::normalize_type_name;
use crate::core::{ColumnMeta, ColumnType, SqlValue};
use crate::error::{DumpError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Like [`DATETIME_FORMAT`] but keeps a fractional part when there is one.
const DATETIME_OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Value representation that does not fit its column class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub column_type: ColumnType,
    pub value_kind: &'static str,
}

impl Mismatch {
    fn new(column_type: ColumnType, value_kind: &'static str) -> Self {
        Self {
            column_type,
            value_kind,
        }
    }

    /// Attach the column name.
    pub fn into_error(self, column: &str) -> DumpError {
        DumpError::ValueMismatch {
            column: column.to_string(),
            column_type: self.column_type.to_string(),
            value_kind: self.value_kind.to_string(),
        }
    }
}

/// Format one value as SQL literal text.
pub fn format_value(
    value: &SqlValue<'_>,
    column_type: ColumnType,
) -> std::result::Result<String, Mismatch> {
    let mut out = String::new();
    write_value(&mut out, value, column_type)?;
    Ok(out)
}

/// Append the literal for `value` to `out`.
pub fn write_value(
    out: &mut String,
    value: &SqlValue<'_>,
    column_type: ColumnType,
) -> std::result::Result<(), Mismatch> {
    if value.is_null() {
        out.push_str("NULL");
        return Ok(());
    }

    let mismatch = || Mismatch::new(column_type, value.kind());

    match column_type {
        ColumnType::Integer => match value {
            SqlValue::Bytes(b) => push_numeric(out, b, is_integer_text).ok_or_else(mismatch),
            SqlValue::Int(i) => push_display(out, i),
            SqlValue::UInt(u) => push_display(out, u),
            SqlValue::Bool(b) => push_display(out, u8::from(*b)),
            _ => Err(mismatch()),
        },

        ColumnType::Float => match value {
            SqlValue::Bytes(b) => push_numeric(out, b, is_float_text).ok_or_else(mismatch),
            SqlValue::Float(f) if f.is_finite() => push_display(out, f),
            SqlValue::Double(d) if d.is_finite() => push_display(out, d),
            SqlValue::Int(i) => push_display(out, i),
            SqlValue::UInt(u) => push_display(out, u),
            _ => Err(mismatch()),
        },

        ColumnType::Decimal => match value {
            SqlValue::Bytes(b) => push_numeric(out, b, is_float_text).ok_or_else(mismatch),
            SqlValue::Decimal(d) => push_display(out, d),
            SqlValue::Int(i) => push_display(out, i),
            SqlValue::UInt(u) => push_display(out, u),
            _ => Err(mismatch()),
        },

        ColumnType::Date => {
            let text = match value {
                SqlValue::Date(d) => d.format(DATE_FORMAT).to_string(),
                SqlValue::DateTime(dt) => dt.date().format(DATE_FORMAT).to_string(),
                SqlValue::Bytes(b) => {
                    let raw = temporal_text(b).ok_or_else(mismatch)?;
                    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
                        Ok(d) => d.format(DATE_FORMAT).to_string(),
                        // zero dates have no chrono representation
                        Err(_) => raw.to_string(),
                    }
                }
                _ => return Err(mismatch()),
            };
            push_quoted(out, &text);
            Ok(())
        }

        ColumnType::DateTime => {
            let text = match value {
                SqlValue::DateTime(dt) => dt.format(DATETIME_OUTPUT_FORMAT).to_string(),
                SqlValue::Date(d) => d.format("%Y-%m-%d 00:00:00").to_string(),
                SqlValue::Bytes(b) => {
                    let raw = temporal_text(b).ok_or_else(mismatch)?;
                    match parse_datetime(raw) {
                        Some(dt) => dt.format(DATETIME_OUTPUT_FORMAT).to_string(),
                        None => raw.to_string(),
                    }
                }
                _ => return Err(mismatch()),
            };
            push_quoted(out, &text);
            Ok(())
        }

        ColumnType::Time => match value {
            SqlValue::Bytes(b) => {
                let raw = temporal_text(b).ok_or_else(mismatch)?;
                push_quoted(out, raw);
                Ok(())
            }
            _ => Err(mismatch()),
        },

        ColumnType::Year => match value {
            SqlValue::Bytes(b) => push_numeric(out, b, is_integer_text).ok_or_else(mismatch),
            SqlValue::Int(i) => push_display(out, i),
            SqlValue::UInt(u) => push_display(out, u),
            _ => Err(mismatch()),
        },

        ColumnType::Text => match value {
            SqlValue::Bytes(b) => {
                let text = std::str::from_utf8(b).map_err(|_| {
                    Mismatch::new(column_type, "non-UTF-8 bytes")
                })?;
                out.push('\'');
                escape_into(out, text);
                out.push('\'');
                Ok(())
            }
            _ => Err(mismatch()),
        },

        ColumnType::Binary => match value {
            SqlValue::Bytes(b) => {
                push_hex(out, b);
                Ok(())
            }
            _ => Err(mismatch()),
        },

        ColumnType::Verbatim => match value {
            SqlValue::Bytes(b) => {
                let text = std::str::from_utf8(b).map_err(|_| {
                    Mismatch::new(column_type, "non-UTF-8 bytes")
                })?;
                push_quoted(out, text);
                Ok(())
            }
            _ => Err(mismatch()),
        },

        ColumnType::Bool => {
            let flag = match value {
                SqlValue::Bool(b) => *b,
                SqlValue::Int(i) => *i != 0,
                SqlValue::UInt(u) => *u != 0,
                SqlValue::Bytes(b) => match b.as_ref() {
                    b"1" | b"true" | b"TRUE" => true,
                    b"0" | b"false" | b"FALSE" => false,
                    _ => return Err(mismatch()),
                },
                _ => return Err(mismatch()),
            };
            out.push_str(if flag { "true" } else { "false" });
            Ok(())
        }
    }
}

/// Escape `text` for use inside a single-quoted SQL string literal.
pub fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    escape_into(&mut out, text);
    out
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{1a}' => out.push_str("\\Z"),
            other => out.push(other),
        }
    }
}

fn push_display(out: &mut String, v: impl std::fmt::Display) -> std::result::Result<(), Mismatch> {
    // writing to a String cannot fail
    let _ = write!(out, "{}", v);
    Ok(())
}

fn push_quoted(out: &mut String, text: &str) {
    out.push('\'');
    out.push_str(text);
    out.push('\'');
}

fn push_hex(out: &mut String, bytes: &[u8]) {
    if bytes.is_empty() {
        out.push_str("X''");
        return;
    }
    out.reserve(2 + bytes.len() * 2);
    out.push_str("0x");
    for b in bytes {
        let _ = write!(out, "{:02X}", b);
    }
}

/// Push driver digits verbatim after checking they really are numeric text.
fn push_numeric(out: &mut String, bytes: &[u8], check: fn(&str) -> bool) -> Option<()> {
    let text = std::str::from_utf8(bytes).ok()?;
    if !check(text) {
        return None;
    }
    out.push_str(text);
    Some(())
}

fn is_integer_text(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_float_text(text: &str) -> bool {
    !text.is_empty()
        && text.bytes().any(|b| b.is_ascii_digit())
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E'))
}

/// Driver text for a temporal value, restricted to the characters MySQL
/// uses when printing dates and times.
fn temporal_text(bytes: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(bytes).ok()?;
    let valid = !text.is_empty()
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'-' | b':' | b' ' | b'.'));
    valid.then_some(text)
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, DATETIME_FORMAT))
        .ok()
}

/// Encodes whole rows of one table.
///
/// Column classes are resolved once, when the encoder is built; an
/// unsupported declared type fails construction before any row is read.
#[derive(Debug, Clone)]
pub struct RowEncoder {
    columns: Vec<(String, ColumnType)>,
}

impl RowEncoder {
    /// Resolve the formatting class of every column of `table`.
    pub fn new(table: &str, columns: &[ColumnMeta]) -> Result<Self> {
        let columns = columns
            .iter()
            .map(|col| {
                ColumnType::from_declared(&col.declared_type)
                    .map(|class| (col.name.clone(), class))
                    .ok_or_else(|| DumpError::UnsupportedType {
                        table: table.to_string(),
                        column: col.name.clone(),
                        type_name: normalize_type_name(&col.declared_type),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { columns })
    }

    /// Append `(v1,v2,...)` for `row` to `out`.
    ///
    /// On error nothing is appended.
    pub fn encode_row(&self, out: &mut String, row: &[SqlValue<'_>]) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(DumpError::ValueMismatch {
                column: "<row>".to_string(),
                column_type: format!("{} columns", self.columns.len()),
                value_kind: format!("{}-value row", row.len()),
            });
        }

        let mark = out.len();
        out.push('(');
        for (i, (value, (name, class))) in row.iter().zip(&self.columns).enumerate() {
            if i > 0 {
                out.push(',');
            }
            if let Err(mismatch) = write_value(out, value, *class) {
                out.truncate(mark);
                return Err(mismatch.into_error(name));
            }
        }
        out.push(')');
        Ok(())
    }
}
