//! Splitting a SQL text stream into statements.
//!
//! The reader understands the subset of client syntax a dump contains:
//! quoted strings and identifiers (`'`, `"`, backtick, with backslash
//! escapes), `-- ` and `#` line comments, and `DELIMITER` lines.

use std::collections::VecDeque;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::{DumpError, Result};

const DEFAULT_DELIMITER: &str = ";";

/// Pulls complete statements out of a buffered byte stream.
pub struct StatementReader<R> {
    input: R,
    delimiter: String,
    pending: String,
    ready: VecDeque<String>,
    quote: Option<u8>,
    escaped: bool,
    line: String,
    line_no: u64,
    eof: bool,
}

impl<R: AsyncBufRead + Unpin + Send> StatementReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            delimiter: DEFAULT_DELIMITER.to_string(),
            pending: String::new(),
            ready: VecDeque::new(),
            quote: None,
            escaped: false,
            line: String::new(),
            line_no: 0,
            eof: false,
        }
    }

    /// Next statement, trimmed and without its terminator.
    ///
    /// A non-empty unterminated tail is returned as the last statement.
    /// `None` once the input is exhausted.
    pub async fn next_statement(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(statement) = self.ready.pop_front() {
                return Ok(Some(statement));
            }
            if self.eof {
                return Ok(None);
            }

            self.line.clear();
            let n = self.input.read_line(&mut self.line).await?;
            if n == 0 {
                self.eof = true;
                self.finish()?;
                continue;
            }
            self.line_no += 1;

            let line = std::mem::take(&mut self.line);
            let consumed = self.handle_delimiter_line(&line)?;
            if !consumed {
                self.scan_line(&line);
            }
            self.line = line;
        }
    }

    /// Current statement terminator.
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Lines read so far.
    pub fn line_number(&self) -> u64 {
        self.line_no
    }

    /// `DELIMITER x` switches the terminator; only valid between statements.
    fn handle_delimiter_line(&mut self, line: &str) -> Result<bool> {
        if self.quote.is_some() || !self.pending.trim().is_empty() {
            return Ok(false);
        }
        let trimmed = line.trim();
        let Some(keyword) = trimmed.get(..9) else {
            return Ok(false);
        };
        let rest = &trimmed[9..];
        if !keyword.eq_ignore_ascii_case("DELIMITER")
            || !rest.starts_with(|c: char| c.is_ascii_whitespace())
        {
            return Ok(false);
        }

        let delimiter = rest.trim();
        if delimiter.is_empty() {
            return Err(DumpError::malformed(
                format!("empty DELIMITER on line {}", self.line_no),
                trimmed,
            ));
        }
        self.delimiter = delimiter.to_string();
        self.pending.clear();
        Ok(true)
    }

    fn scan_line(&mut self, line: &str) {
        let bytes = line.as_bytes();
        let delimiter = self.delimiter.as_bytes();
        let mut start = 0;
        let mut i = 0;

        while i < bytes.len() {
            let b = bytes[i];

            if let Some(quote) = self.quote {
                if self.escaped {
                    self.escaped = false;
                } else if b == b'\\' && quote != b'`' {
                    self.escaped = true;
                } else if b == quote {
                    self.quote = None;
                }
                i += 1;
                continue;
            }

            if bytes[i..].starts_with(delimiter) {
                self.pending.push_str(&line[start..i]);
                let statement = self.pending.trim();
                if !statement.is_empty() {
                    self.ready.push_back(statement.to_string());
                }
                self.pending.clear();
                i += delimiter.len();
                start = i;
                continue;
            }

            match b {
                b'\'' | b'"' | b'`' => self.quote = Some(b),
                b'#' => break,
                b'-' if is_dash_comment(&bytes[i..]) => break,
                _ => {}
            }
            i += 1;
        }

        // a line comment drops the rest of the line but keeps the newline
        if i < bytes.len() {
            self.pending.push_str(&line[start..i]);
            self.pending.push('\n');
        } else {
            self.pending.push_str(&line[start..]);
        }
    }

    fn finish(&mut self) -> Result<()> {
        if self.quote.is_some() {
            return Err(DumpError::malformed(
                "unterminated quoted string at end of input",
                &self.pending,
            ));
        }
        let tail = self.pending.trim();
        if !tail.is_empty() {
            self.ready.push_back(tail.to_string());
        }
        self.pending.clear();
        Ok(())
    }
}

/// `--` starts a comment only when followed by whitespace or end of line.
fn is_dash_comment(rest: &[u8]) -> bool {
    rest.starts_with(b"--") && rest.get(2).map_or(true, |c| c.is_ascii_whitespace())
}
