//! Replaying a SQL text stream against a database.
//!
//! The [`Restorer`] reads statements with a [`StatementReader`], optionally
//! merges runs of `INSERT` statements, and hands each resulting statement to
//! a [`SqlExecutor`]. The whole stream runs inside one transaction
//! (`autocommit=0` ... `COMMIT`).

pub mod executor;
pub mod merge;
pub mod reader;

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncBufRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::RestoreOptions;
use crate::core::identifier::quote_ident;
use crate::error::{DumpError, Result};

pub use executor::{DryRunExecutor, MysqlExecutor, SqlExecutor};
pub use merge::StatementBatch;
pub use reader::StatementReader;

/// Counters for a finished restore.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreSummary {
    /// Statements read from the input.
    pub statements_read: u64,
    /// Statements dispatched after merging (session control excluded).
    pub statements_executed: u64,
    /// Statements folded into a preceding `INSERT`.
    pub inserts_merged: u64,
    pub dry_run: bool,
    pub duration_ms: u64,
}

impl RestoreSummary {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One restore run.
pub struct Restorer<E> {
    executor: E,
    options: RestoreOptions,
    database: Option<String>,
}

impl<E: SqlExecutor> Restorer<E> {
    pub fn new(executor: E, options: RestoreOptions) -> Self {
        Self {
            executor,
            options,
            database: None,
        }
    }

    /// Issue `USE <database>` before the first statement.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    /// Read `input` to the end, executing every statement, then commit.
    pub async fn run<R>(&mut self, input: R, cancel: &CancellationToken) -> Result<RestoreSummary>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let clock = Instant::now();
        let mut summary = RestoreSummary {
            dry_run: self.options.dry_run,
            ..RestoreSummary::default()
        };
        let merge_size = self.options.merge_inserts.max(1);
        info!(
            "Restoring (merge_inserts={}, mode={:?}, dry_run={})",
            merge_size, self.options.merge_mode, self.options.dry_run
        );

        if let Some(database) = &self.database {
            let statement = format!("USE {}", quote_ident(database)?);
            self.executor.execute(&statement).await?;
        }
        self.executor.execute("SET autocommit=0").await?;

        let mut reader = StatementReader::new(input);
        let mut carried: Option<String> = None;

        loop {
            if cancel.is_cancelled() {
                return Err(DumpError::Cancelled);
            }

            let statement = match carried.take() {
                Some(statement) => statement,
                None => match reader.next_statement().await? {
                    Some(statement) => {
                        summary.statements_read += 1;
                        statement
                    }
                    None => break,
                },
            };

            if merge_size < 2 || !merge::is_insert(&statement) {
                self.dispatch(&statement, &mut summary).await?;
                continue;
            }

            let mut batch = StatementBatch::start(statement, self.options.merge_mode)?;
            while batch.len() < merge_size {
                let Some(next) = reader.next_statement().await? else {
                    break;
                };
                summary.statements_read += 1;
                if !(merge::is_insert(&next) && batch.try_push(&next)?) {
                    carried = Some(next);
                    break;
                }
            }

            summary.inserts_merged += (batch.len() - 1) as u64;
            self.dispatch(&batch.into_statement(), &mut summary).await?;
        }

        self.executor.execute("COMMIT").await?;
        self.executor.execute("SET autocommit=1").await?;

        summary.duration_ms = clock.elapsed().as_millis() as u64;
        info!(
            "Restore finished: {} statements read from {} lines, {} executed, {} merged",
            summary.statements_read,
            reader.line_number(),
            summary.statements_executed,
            summary.inserts_merged
        );
        Ok(summary)
    }

    async fn dispatch(&mut self, statement: &str, summary: &mut RestoreSummary) -> Result<()> {
        if self.options.verbose {
            info!("Executing: {}", preview(statement));
        } else {
            debug!("Executing: {}", preview(statement));
        }
        self.executor.execute(statement).await?;
        summary.statements_executed += 1;
        Ok(())
    }
}

fn preview(statement: &str) -> String {
    let mut chars = statement.chars();
    let head: String = chars.by_ref().take(80).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
