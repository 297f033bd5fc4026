//! Combining consecutive `INSERT` statements into one multi-row statement.
//!
//! Two mechanisms, chosen by [`MergeMode`]:
//!
//! - **structural**: each statement is split into target, column list and
//!   value tuples. A statement joins the batch only when target and column
//!   list match the first one and its value section is a plain tuple list.
//! - **splice**: everything after each statement's `VALUES` keyword is
//!   appended to the first statement, without looking at column lists.

use crate::codec::literal::{skip_quoted, split_tuples};
use crate::config::MergeMode;
use crate::error::{DumpError, Result};

/// Whether `statement` is an `INSERT INTO ...`.
pub fn is_insert(statement: &str) -> bool {
    let mut words = statement.split_ascii_whitespace();
    matches!(
        (words.next(), words.next()),
        (Some(a), Some(b)) if a.eq_ignore_ascii_case("INSERT") && b.eq_ignore_ascii_case("INTO")
    )
}

/// Byte range of the first unquoted `VALUES` keyword.
pub fn find_values_keyword(statement: &str) -> Option<(usize, usize)> {
    let bytes = statement.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' | b'`' => {
                i = skip_quoted(bytes, i)?;
                continue;
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                let word = &statement[start..i];
                if word.eq_ignore_ascii_case("VALUES") {
                    return Some((start, i));
                }
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// An `INSERT` split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertParts<'a> {
    /// Target table as written (possibly `db`.`table`).
    pub target: &'a str,
    /// Column list including parentheses, `None` when omitted.
    pub columns: Option<&'a str>,
    /// Text up to and including the `VALUES` keyword.
    pub head: &'a str,
    /// The tuple list after `VALUES`, trimmed.
    pub values: &'a str,
}

impl InsertParts<'_> {
    /// Target and column list with insignificant whitespace removed.
    fn merge_key(&self) -> (String, Option<String>) {
        let squash = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        (squash(self.target), self.columns.map(squash))
    }
}

/// Split an `INSERT INTO t (cols) VALUES (..),(..)` statement.
///
/// Returns `None` for anything that is not a plain multi-row insert: a
/// missing `VALUES`, `INSERT ... SELECT`, `SET` syntax, or trailing clauses
/// such as `ON DUPLICATE KEY UPDATE`.
pub fn parse_insert(statement: &str) -> Option<InsertParts<'_>> {
    let prefix = insert_prefix(statement)?;
    let i = prefix.end;

    let (kw_start, kw_end) = find_values_keyword(&statement[i..])?;
    if kw_start != 0 {
        return None;
    }
    let head_end = i + kw_end;
    let values = statement[head_end..].trim();
    split_tuples(values)?;

    Some(InsertParts {
        target: prefix.target,
        columns: prefix.columns,
        head: &statement[..head_end],
        values,
    })
}

/// Target and column list of an `INSERT`, and where the text after them starts.
struct InsertPrefix<'a> {
    target: &'a str,
    columns: Option<&'a str>,
    end: usize,
}

fn insert_prefix(statement: &str) -> Option<InsertPrefix<'_>> {
    if !is_insert(statement) {
        return None;
    }
    let bytes = statement.as_bytes();

    // skip the two keywords
    let into = statement.to_ascii_uppercase().find("INTO")?;
    let mut i = skip_ws(bytes, into + 4);

    let target_start = i;
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'(' {
        if bytes[i] == b'`' {
            i = skip_quoted(bytes, i)?;
        } else {
            i += 1;
        }
    }
    let target = &statement[target_start..i];
    if target.is_empty() {
        return None;
    }

    i = skip_ws(bytes, i);
    let columns = if bytes.get(i) == Some(&b'(') {
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
        let list = &statement[start..i];
        i = skip_ws(bytes, i);
        Some(list)
    } else {
        None
    };

    Some(InsertPrefix {
        target,
        columns,
        end: i,
    })
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(|b| b.is_ascii_whitespace()) {
        i += 1;
    }
    i
}

/// Consecutive `INSERT` statements sharing one `INSERT ... VALUES` prefix.
#[derive(Debug, Clone)]
pub struct StatementBatch {
    mode: MergeMode,
    first: String,
    head: String,
    key: Option<(String, Option<String>)>,
    values: String,
    statements: usize,
}

impl StatementBatch {
    /// Start a batch with its first statement.
    ///
    /// In splice mode a statement without `VALUES` is malformed. In
    /// structural mode such a statement simply forms a batch of one.
    pub fn start(first: String, mode: MergeMode) -> Result<Self> {
        let (head, key, values) = match mode {
            MergeMode::Structural => match parse_insert(&first) {
                Some(parts) => (
                    parts.head.to_string(),
                    Some(parts.merge_key()),
                    parts.values.to_string(),
                ),
                None => (String::new(), None, String::new()),
            },
            MergeMode::Splice => {
                let (_, end) = splice_point(&first)?;
                (
                    first[..end].to_string(),
                    None,
                    first[end..].trim().to_string(),
                )
            }
        };

        Ok(Self {
            mode,
            first,
            head,
            key,
            values,
            statements: 1,
        })
    }

    /// Try to add `statement` to the batch.
    ///
    /// `Ok(false)` means it does not belong here and must be handled on its
    /// own; the batch is unchanged.
    pub fn try_push(&mut self, statement: &str) -> Result<bool> {
        let values = match self.mode {
            MergeMode::Structural => {
                let Some(key) = &self.key else {
                    return Ok(false);
                };
                match parse_insert(statement) {
                    Some(parts) if &parts.merge_key() == key => parts.values,
                    _ => return Ok(false),
                }
            }
            MergeMode::Splice => {
                let (_, end) = splice_point(statement)?;
                statement[end..].trim()
            }
        };

        self.values.push(',');
        self.values.push_str(values);
        self.statements += 1;
        Ok(true)
    }

    /// Number of statements in the batch.
    pub fn len(&self) -> usize {
        self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements == 0
    }

    /// The single statement to execute.
    pub fn into_statement(self) -> String {
        if self.statements == 1 {
            return self.first;
        }
        format!("{} {}", self.head, self.values)
    }
}

/// Location of `VALUES` for splicing, searched after the target and column
/// list so identifiers spelled like the keyword are never taken for it.
fn splice_point(statement: &str) -> Result<(usize, usize)> {
    let from = insert_prefix(statement).map_or(0, |prefix| prefix.end);
    find_values_keyword(&statement[from..])
        .map(|(start, end)| (from + start, from + end))
        .ok_or_else(|| DumpError::malformed("invalid SQL: missing VALUES keyword", statement))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_insert() {
        assert!(is_insert("INSERT INTO `t` VALUES (1)"));
        assert!(is_insert("insert\n  into t values (1)"));
        assert!(!is_insert("INSERT t VALUES (1)"));
        assert!(!is_insert("SELECT 1"));
        assert!(!is_insert("INSERTINTO"));
    }

    #[test]
    fn test_find_values_skips_quotes() {
        let stmt = "INSERT INTO `values` (`VALUES`) VALUES ('VALUES')";
        let (start, end) = find_values_keyword(stmt).unwrap();
        assert_eq!(&stmt[start..end], "VALUES");
        assert_eq!(start, 32);
    }

    #[test]
    fn test_parse_insert_parts() {
        let parts = parse_insert("INSERT INTO `db`.`t` (`a`, `b`) VALUES (1,'x'),(2,'y')").unwrap();
        assert_eq!(parts.target, "`db`.`t`");
        assert_eq!(parts.columns, Some("(`a`, `b`)"));
        assert_eq!(parts.head, "INSERT INTO `db`.`t` (`a`, `b`) VALUES");
        assert_eq!(parts.values, "(1,'x'),(2,'y')");
    }

    #[test]
    fn test_parse_insert_without_columns() {
        let parts = parse_insert("INSERT INTO t VALUES (1)").unwrap();
        assert_eq!(parts.target, "t");
        assert_eq!(parts.columns, None);
    }

    #[test]
    fn test_parse_insert_rejects_non_plain_forms() {
        assert!(parse_insert("INSERT INTO t (a) VALUES (1) ON DUPLICATE KEY UPDATE a=1").is_none());
        assert!(parse_insert("INSERT INTO t (a) SELECT a FROM u").is_none());
        assert!(parse_insert("INSERT INTO t SET a=1").is_none());
    }

    #[test]
    fn test_structural_merge() {
        let mut batch = StatementBatch::start(
            "INSERT INTO `t` (`a`,`b`) VALUES (1,'x')".to_string(),
            MergeMode::Structural,
        )
        .unwrap();
        assert!(batch.try_push("INSERT INTO `t` (`a`, `b`) VALUES (2,'y'),(3,'z')").unwrap());
        assert_eq!(batch.len(), 2);
        assert_eq!(
            batch.into_statement(),
            "INSERT INTO `t` (`a`,`b`) VALUES (1,'x'),(2,'y'),(3,'z')"
        );
    }

    #[test]
    fn test_structural_rejects_other_columns_or_table() {
        let mut batch = StatementBatch::start(
            "INSERT INTO `t` (`a`) VALUES (1)".to_string(),
            MergeMode::Structural,
        )
        .unwrap();
        assert!(!batch.try_push("INSERT INTO `t` (`b`) VALUES (2)").unwrap());
        assert!(!batch.try_push("INSERT INTO `u` (`a`) VALUES (2)").unwrap());
        assert!(!batch.try_push("INSERT INTO `t` (`a`) VALUES (2) ON DUPLICATE KEY UPDATE a=2").unwrap());
        assert_eq!(batch.into_statement(), "INSERT INTO `t` (`a`) VALUES (1)");
    }

    #[test]
    fn test_structural_unparseable_first_stays_alone() {
        let first = "INSERT INTO t SELECT * FROM u".to_string();
        let mut batch = StatementBatch::start(first.clone(), MergeMode::Structural).unwrap();
        assert!(!batch.try_push("INSERT INTO t VALUES (1)").unwrap());
        assert_eq!(batch.into_statement(), first);
    }

    #[test]
    fn test_splice_appends_blindly() {
        let mut batch =
            StatementBatch::start("INSERT INTO t (a) VALUES (1)".to_string(), MergeMode::Splice).unwrap();
        assert!(batch.try_push("INSERT INTO t (b) VALUES (2)").unwrap());
        assert_eq!(batch.into_statement(), "INSERT INTO t (a) VALUES (1),(2)");
    }

    #[test]
    fn test_splice_ignores_identifiers_named_like_keyword() {
        let mut batch = StatementBatch::start(
            "INSERT INTO t (id, value) VALUES (1,2)".to_string(),
            MergeMode::Splice,
        )
        .unwrap();
        assert!(batch.try_push("INSERT INTO t (id, value) VALUES (3,4)").unwrap());
        assert_eq!(
            batch.into_statement(),
            "INSERT INTO t (id, value) VALUES (1,2),(3,4)"
        );

        let mut batch =
            StatementBatch::start("INSERT INTO values VALUES (1)".to_string(), MergeMode::Splice)
                .unwrap();
        assert!(batch.try_push("INSERT INTO values (values) VALUES (2)").unwrap());
        assert_eq!(batch.into_statement(), "INSERT INTO values VALUES (1),(2)");
    }

    #[test]
    fn test_find_values_ignores_value_word() {
        assert_eq!(find_values_keyword("INSERT INTO t (value) VALUE (1)"), None);
    }

    #[test]
    fn test_splice_missing_values_is_malformed() {
        let err = StatementBatch::start("INSERT INTO t SET a=1".to_string(), MergeMode::Splice).unwrap_err();
        assert!(err.to_string().contains("missing VALUES keyword"));

        let mut batch =
            StatementBatch::start("INSERT INTO t VALUES (1)".to_string(), MergeMode::Splice).unwrap();
        assert!(batch.try_push("INSERT INTO t SET a=2").is_err());
    }

    #[test]
    fn test_merged_rows_resplit_in_order() {
        let mut batch =
            StatementBatch::start("INSERT INTO t VALUES (1,'a;b')".to_string(), MergeMode::Structural)
                .unwrap();
        batch.try_push("INSERT INTO t VALUES (2,'c),(d')").unwrap();
        batch.try_push("INSERT INTO t VALUES (3,NULL)").unwrap();
        let merged = batch.into_statement();
        let parts = parse_insert(&merged).unwrap();
        assert_eq!(
            split_tuples(parts.values).unwrap(),
            vec!["(1,'a;b')", "(2,'c),(d')", "(3,NULL)"]
        );
    }
}
