//! Reading SQL literal text back into values.
//!
//! Only the literal forms produced by [`super::format_value`] are recognized:
//! `NULL`, numbers, single/double-quoted strings with MySQL backslash
//! escapes, `0x..`/`X'..'` hex, and `true`/`false`.

use std::borrow::Cow;

use crate::core::SqlValue;
use crate::error::{DumpError, Result};

/// A decoded literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    /// Numeric text, kept as written.
    Number(String),
    /// Unescaped string contents.
    Text(Vec<u8>),
    /// Decoded hex bytes.
    Hex(Vec<u8>),
    Bool(bool),
}

impl Literal {
    /// Convert into the value the driver would have delivered.
    pub fn into_value(self) -> SqlValue<'static> {
        match self {
            Literal::Null => SqlValue::Null,
            Literal::Number(n) => SqlValue::Bytes(Cow::Owned(n.into_bytes())),
            Literal::Text(b) | Literal::Hex(b) => SqlValue::Bytes(Cow::Owned(b)),
            Literal::Bool(b) => SqlValue::Bool(b),
        }
    }
}

/// Parse a single literal.
pub fn parse_literal(text: &str) -> Result<Literal> {
    let text = text.trim();
    let bad = || DumpError::malformed("unrecognized literal", text);

    if text.eq_ignore_ascii_case("NULL") {
        return Ok(Literal::Null);
    }
    if text.eq_ignore_ascii_case("true") {
        return Ok(Literal::Bool(true));
    }
    if text.eq_ignore_ascii_case("false") {
        return Ok(Literal::Bool(false));
    }

    let bytes = text.as_bytes();
    match bytes.first() {
        Some(b'\'') | Some(b'"') => {
            let end = skip_quoted(bytes, 0).ok_or_else(bad)?;
            if end != bytes.len() {
                return Err(bad());
            }
            Ok(Literal::Text(unescape(&text[1..text.len() - 1], bytes[0])))
        }
        Some(b'0') if bytes.get(1).is_some_and(|b| *b == b'x' || *b == b'X') => {
            decode_hex(&text[2..]).map(Literal::Hex).ok_or_else(bad)
        }
        Some(b'X') | Some(b'x') if bytes.get(1) == Some(&b'\'') => {
            let inner = text[2..].strip_suffix('\'').ok_or_else(bad)?;
            decode_hex(inner).map(Literal::Hex).ok_or_else(bad)
        }
        Some(b) if b.is_ascii_digit() || *b == b'-' || *b == b'+' || *b == b'.' => {
            if super::is_float_text(text) {
                Ok(Literal::Number(text.to_string()))
            } else {
                Err(bad())
            }
        }
        _ => Err(bad()),
    }
}

/// Undo MySQL string escaping for the body of a literal quoted with `quote`.
pub fn unescape(body: &str, quote: u8) -> Vec<u8> {
    let bytes = body.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' && i + 1 < bytes.len() {
            let next = bytes[i + 1];
            match next {
                b'0' => out.push(0),
                b'b' => out.push(0x08),
                b'n' => out.push(b'\n'),
                b'r' => out.push(b'\r'),
                b't' => out.push(b'\t'),
                b'Z' => out.push(0x1a),
                // LIKE wildcards keep their backslash
                b'%' | b'_' => {
                    out.push(b'\\');
                    out.push(next);
                }
                other => out.push(other),
            }
            i += 2;
        } else if b == quote && bytes.get(i + 1) == Some(&quote) {
            out.push(quote);
            i += 2;
        } else {
            out.push(b);
            i += 1;
        }
    }
    out
}

fn decode_hex(digits: &str) -> Option<Vec<u8>> {
    if digits.len() % 2 != 0 {
        return None;
    }
    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16)?;
            let lo = (pair[1] as char).to_digit(16)?;
            Some((hi * 16 + lo) as u8)
        })
        .collect()
}

/// Index just past the quoted section starting at `start`.
///
/// Handles backslash escapes and doubled quotes. Returns `None` when the
/// quote is not closed.
pub fn skip_quoted(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' && quote != b'`' {
            i += 2;
        } else if b == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
            } else {
                return Some(i + 1);
            }
        } else {
            i += 1;
        }
    }
    None
}

/// Split a `VALUES` section into its tuples.
///
/// `"(1,'a'), (2,'b')"` yields `["(1,'a')", "(2,'b')"]`. Returns `None` if
/// the text is not a pure comma-separated tuple list (an `ON DUPLICATE KEY`
/// clause, unbalanced parentheses, an unclosed quote).
pub fn split_tuples(values: &str) -> Option<Vec<&str>> {
    let bytes = values.as_bytes();
    let mut tuples = Vec::new();
    let mut i = skip_ws(bytes, 0);

    while i < bytes.len() {
        if bytes[i] != b'(' {
            return None;
        }
        let start = i;
        let mut depth = 0usize;
        loop {
            match bytes.get(i)? {
                b'\'' | b'"' | b'`' => {
                    i = skip_quoted(bytes, i)?;
                    continue;
                }
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        i += 1;
                        break;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        tuples.push(&values[start..i]);

        i = skip_ws(bytes, i);
        match bytes.get(i) {
            None => break,
            Some(b',') => i = skip_ws(bytes, i + 1),
            Some(_) => return None,
        }
    }

    if tuples.is_empty() {
        None
    } else {
        Some(tuples)
    }
}

/// Split a single `(a,b,c)` tuple into its field texts.
pub fn split_fields(tuple: &str) -> Option<Vec<&str>> {
    let inner = tuple.trim().strip_prefix('(')?.strip_suffix(')')?;
    let bytes = inner.as_bytes();
    let mut fields = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' | b'`' => {
                i = skip_quoted(bytes, i)?;
                continue;
            }
            b'(' => depth += 1,
            b')' => depth = depth.checked_sub(1)?,
            b',' if depth == 0 => {
                fields.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    fields.push(inner[start..].trim());
    Some(fields)
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(|b| b.is_ascii_whitespace()) {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::format_value;
    use crate::core::ColumnType;

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse_literal("NULL").unwrap(), Literal::Null);
        assert_eq!(parse_literal("true").unwrap(), Literal::Bool(true));
        assert_eq!(parse_literal("-42").unwrap(), Literal::Number("-42".into()));
        assert_eq!(parse_literal("1.5e10").unwrap(), Literal::Number("1.5e10".into()));
    }

    #[test]
    fn test_parse_strings() {
        assert_eq!(
            parse_literal(r"'it\'s'").unwrap(),
            Literal::Text(b"it's".to_vec())
        );
        assert_eq!(
            parse_literal("'it''s'").unwrap(),
            Literal::Text(b"it's".to_vec())
        );
        assert_eq!(
            parse_literal(r#"'\0\b\n\r\Z\\\"'"#).unwrap(),
            Literal::Text(vec![0, 8, b'\n', b'\r', 0x1a, b'\\', b'"'])
        );
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_literal("0x00FF").unwrap(), Literal::Hex(vec![0, 255]));
        assert_eq!(parse_literal("X''").unwrap(), Literal::Hex(Vec::new()));
        assert!(parse_literal("0xF").is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_literal("'open").is_err());
        assert!(parse_literal("'a' 'b'").is_err());
        assert!(parse_literal("DROP").is_err());
        for sign_only in ["-", "+", ".", "-.", "e"] {
            assert!(parse_literal(sign_only).is_err(), "{sign_only:?}");
        }
    }

    #[test]
    fn test_split_tuples() {
        let tuples = split_tuples(" (1,'a'),\n(2,'b)(,'), (3,NULL)").unwrap();
        assert_eq!(tuples, vec!["(1,'a')", "(2,'b)(,')", "(3,NULL)"]);
    }

    #[test]
    fn test_split_tuples_rejects_trailing_clause() {
        assert!(split_tuples("(1,2) ON DUPLICATE KEY UPDATE a=1").is_none());
        assert!(split_tuples("(1,'unclosed)").is_none());
        assert!(split_tuples("").is_none());
    }

    #[test]
    fn test_split_fields() {
        let fields = split_fields(r"(1, 'a,b', 'x\'y', 0xAB)").unwrap();
        assert_eq!(fields, vec!["1", "'a,b'", r"'x\'y'", "0xAB"]);
    }

    fn reformat(literal: &str, class: ColumnType) -> String {
        let value = parse_literal(literal).unwrap().into_value();
        format_value(&value, class).unwrap()
    }

    #[test]
    fn test_round_trip_all_classes() {
        use chrono::NaiveDate;
        use rust_decimal::Decimal;
        use std::str::FromStr;

        let dt = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_micro_opt(23, 59, 59, 500_000)
            .unwrap();
        let cases: Vec<(SqlValue<'static>, ColumnType)> = vec![
            (SqlValue::Int(i64::MIN), ColumnType::Integer),
            (SqlValue::UInt(u64::MAX), ColumnType::Integer),
            (SqlValue::Double(-1.0e-300), ColumnType::Float),
            (SqlValue::Float(f32::MAX), ColumnType::Float),
            (SqlValue::Decimal(Decimal::from_str("-12.3400").unwrap()), ColumnType::Decimal),
            (SqlValue::Date(dt.date()), ColumnType::Date),
            (SqlValue::DateTime(dt), ColumnType::DateTime),
            (SqlValue::from("-838:59:59.000001").into_owned(), ColumnType::Time),
            (SqlValue::from("1901").into_owned(), ColumnType::Year),
            (SqlValue::from("Zoë's \"quoted\" \\ 日本語").into_owned(), ColumnType::Text),
            (SqlValue::bytes_owned(vec![0, 0x27, 0x5c, 0xff]), ColumnType::Binary),
            (SqlValue::bytes_owned(Vec::new()), ColumnType::Binary),
            (SqlValue::from(r#"{"k":[1,2]}"#).into_owned(), ColumnType::Verbatim),
            (SqlValue::Bool(false), ColumnType::Bool),
            (SqlValue::Null, ColumnType::Text),
            (SqlValue::Null, ColumnType::Binary),
        ];

        for (value, class) in cases {
            let first = format_value(&value, class).unwrap();
            assert_eq!(reformat(&first, class), first, "class {class}");
        }
    }

    #[test]
    fn test_escaped_specials_decode_to_original() {
        let original = "\0'\"\\\u{8}\n\r\u{1a}\ttail";
        let literal = format_value(&SqlValue::from(original), ColumnType::Text).unwrap();
        assert_eq!(
            parse_literal(&literal).unwrap(),
            Literal::Text(original.as_bytes().to_vec())
        );
    }
}
