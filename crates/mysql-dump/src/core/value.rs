//! Raw column values as delivered by the driver.
//!
//! The text protocol delivers almost everything as [`SqlValue::Bytes`]; the
//! typed variants cover values produced by the binary protocol and by tests.

use std::borrow::Cow;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

/// A single raw column value.
///
/// Uses `Cow` for byte data so values can borrow from a row buffer while
/// they are formatted, and be made owned with [`SqlValue::into_owned`].
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue<'a> {
    /// SQL NULL.
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer.
    Int(i64),

    /// Unsigned integer (BIGINT UNSIGNED can exceed `i64`).
    UInt(u64),

    /// Single precision float.
    Float(f32),

    /// Double precision float.
    Double(f64),

    /// Exact decimal; its scale is preserved when printed.
    Decimal(Decimal),

    /// Raw bytes exactly as the driver returned them (textual digits,
    /// character data, binary data, TIME/YEAR text).
    Bytes(Cow<'a, [u8]>),

    /// Calendar date.
    Date(NaiveDate),

    /// Date and time without timezone.
    DateTime(NaiveDateTime),
}

impl<'a> SqlValue<'a> {
    /// Convert to a fully owned value with `'static` lifetime.
    #[must_use]
    pub fn into_owned(self) -> SqlValue<'static> {
        match self {
            SqlValue::Null => SqlValue::Null,
            SqlValue::Bool(v) => SqlValue::Bool(v),
            SqlValue::Int(v) => SqlValue::Int(v),
            SqlValue::UInt(v) => SqlValue::UInt(v),
            SqlValue::Float(v) => SqlValue::Float(v),
            SqlValue::Double(v) => SqlValue::Double(v),
            SqlValue::Decimal(v) => SqlValue::Decimal(v),
            SqlValue::Bytes(v) => SqlValue::Bytes(Cow::Owned(v.into_owned())),
            SqlValue::Date(v) => SqlValue::Date(v),
            SqlValue::DateTime(v) => SqlValue::DateTime(v),
        }
    }

    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Short name of the runtime representation, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::Int(_) => "int",
            SqlValue::UInt(_) => "uint",
            SqlValue::Float(_) => "float",
            SqlValue::Double(_) => "double",
            SqlValue::Decimal(_) => "decimal",
            SqlValue::Bytes(_) => "bytes",
            SqlValue::Date(_) => "date",
            SqlValue::DateTime(_) => "datetime",
        }
    }

    /// Create a bytes value from a borrowed byte slice.
    #[must_use]
    pub fn bytes_borrowed(b: &'a [u8]) -> Self {
        SqlValue::Bytes(Cow::Borrowed(b))
    }

    /// Create a bytes value from an owned Vec<u8>.
    #[must_use]
    pub fn bytes_owned(b: Vec<u8>) -> SqlValue<'static> {
        SqlValue::Bytes(Cow::Owned(b))
    }
}

impl From<bool> for SqlValue<'static> {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i64> for SqlValue<'static> {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<u64> for SqlValue<'static> {
    fn from(v: u64) -> Self {
        SqlValue::UInt(v)
    }
}

impl From<f64> for SqlValue<'static> {
    fn from(v: f64) -> Self {
        SqlValue::Double(v)
    }
}

impl From<Decimal> for SqlValue<'static> {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<String> for SqlValue<'static> {
    fn from(v: String) -> Self {
        SqlValue::Bytes(Cow::Owned(v.into_bytes()))
    }
}

impl<'a> From<&'a str> for SqlValue<'a> {
    fn from(v: &'a str) -> Self {
        SqlValue::Bytes(Cow::Borrowed(v.as_bytes()))
    }
}

impl From<Vec<u8>> for SqlValue<'static> {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(Cow::Owned(v))
    }
}

impl<'a> From<&'a [u8]> for SqlValue<'a> {
    fn from(v: &'a [u8]) -> Self {
        SqlValue::Bytes(Cow::Borrowed(v))
    }
}

impl From<NaiveDate> for SqlValue<'static> {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<NaiveDateTime> for SqlValue<'static> {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl From<mysql_async::Value> for SqlValue<'static> {
    /// Temporal values that chrono cannot represent (zero dates, TIME
    /// intervals beyond 24h) are rendered to the server's text form.
    fn from(v: mysql_async::Value) -> Self {
        use mysql_async::Value;

        match v {
            Value::NULL => SqlValue::Null,
            Value::Bytes(b) => SqlValue::Bytes(Cow::Owned(b)),
            Value::Int(i) => SqlValue::Int(i),
            Value::UInt(u) => SqlValue::UInt(u),
            Value::Float(f) => SqlValue::Float(f),
            Value::Double(d) => SqlValue::Double(d),
            Value::Date(year, month, day, hour, minute, second, micros) => {
                let datetime = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
                    .and_then(|d| {
                        d.and_hms_micro_opt(hour as u32, minute as u32, second as u32, micros)
                    });
                match datetime {
                    Some(dt) => SqlValue::DateTime(dt),
                    None => SqlValue::from(format!(
                        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                        year, month, day, hour, minute, second
                    )),
                }
            }
            Value::Time(negative, days, hours, minutes, seconds, micros) => {
                let sign = if negative { "-" } else { "" };
                let total_hours = days * 24 + hours as u32;
                let text = if micros > 0 {
                    format!(
                        "{}{:02}:{:02}:{:02}.{:06}",
                        sign, total_hours, minutes, seconds, micros
                    )
                } else {
                    format!("{}{:02}:{:02}:{:02}", sign, total_hours, minutes, seconds)
                };
                SqlValue::from(text)
            }
        }
    }
}
