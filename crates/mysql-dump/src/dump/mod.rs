//! Dump orchestration.
//!
//! A [`Dumper`] walks the selected databases and, for every table or view,
//! writes (in order) an optional `DROP`, the structure, the data section and
//! the triggers, between a header and a footer banner. Any error aborts the
//! dump; whatever was already written stays written.

pub mod batch;
pub mod template;
pub mod triggers;

use std::time::Instant;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DumpOptions;
use crate::core::identifier::quote_ident;
use crate::core::{CatalogEntry, TableDescriptor, TableKind};
use crate::error::{DumpError, Result};
use crate::source::DumpSource;

pub use batch::{BatchTotals, RowBatchEmitter};
pub use triggers::TriggerCache;

use template::{render_footer, render_header, section_banner, HeaderInfo};
use triggers::render_triggers;

/// Counters for a finished dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpSummary {
    pub databases: usize,
    pub tables: usize,
    pub views: usize,
    /// Catalog objects of kinds the dump does not handle.
    pub skipped: usize,
    pub rows: u64,
    pub insert_statements: u64,
    pub triggers: usize,
    pub bytes: u64,
    pub duration_ms: u64,
}

impl DumpSummary {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Output stream that counts what passes through it.
pub struct DumpWriter<W> {
    inner: W,
    bytes: u64,
}

impl<W: AsyncWrite + Unpin + Send> DumpWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    pub async fn write_str(&mut self, text: &str) -> Result<()> {
        self.inner.write_all(text.as_bytes()).await?;
        self.bytes += text.len() as u64;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.inner.flush().await?;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// One dump session: a source connection, the options and the trigger cache.
pub struct Dumper<S> {
    source: S,
    options: DumpOptions,
    triggers: TriggerCache,
}

impl<S: DumpSource> Dumper<S> {
    pub fn new(source: S, options: DumpOptions) -> Self {
        Self {
            source,
            options,
            triggers: TriggerCache::new(),
        }
    }

    /// Give the connection back once the session is over.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Write the complete dump to `sink`.
    pub async fn dump<W>(&mut self, sink: &mut W, cancel: &CancellationToken) -> Result<DumpSummary>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let clock = Instant::now();
        let started = Local::now();
        let mut out = DumpWriter::new(sink);
        let mut summary = DumpSummary::default();

        let server_version = self.source.server_version().await?;
        let databases = self.resolve_databases().await?;
        info!(
            "Dumping {} database(s) from {} (server {})",
            databases.len(),
            self.source.host(),
            server_version
        );

        out.write_str(&render_header(&HeaderInfo {
            host: self.source.host(),
            databases: &databases,
            started,
            server_version: &server_version,
        }))
        .await?;

        let emit_use = databases.len() > 1 || self.options.use_database;
        for database in &databases {
            if cancel.is_cancelled() {
                return Err(DumpError::Cancelled);
            }
            self.dump_database(&mut out, database, emit_use, cancel, &mut summary)
                .await?;
            summary.databases += 1;
        }

        out.write_str(&render_footer(clock.elapsed())).await?;
        out.flush().await?;

        summary.bytes = out.bytes_written();
        summary.duration_ms = clock.elapsed().as_millis() as u64;
        info!(
            "Dump finished: {} tables, {} views, {} rows, {} bytes",
            summary.tables, summary.views, summary.rows, summary.bytes
        );
        Ok(summary)
    }

    async fn resolve_databases(&mut self) -> Result<Vec<String>> {
        if self.options.all_databases {
            return self.source.list_databases().await;
        }
        if self.options.databases.is_empty() {
            return Err(DumpError::Config(
                "no database selected: set dump.databases or connection.database".into(),
            ));
        }
        Ok(self.options.databases.clone())
    }

    async fn dump_database<W>(
        &mut self,
        out: &mut DumpWriter<W>,
        database: &str,
        emit_use: bool,
        cancel: &CancellationToken,
        summary: &mut DumpSummary,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        self.source.use_database(database).await?;
        let entries = self.select_objects(database).await?;

        if emit_use {
            out.write_str(&format!("USE {};\n\n", quote_ident(database)?))
                .await?;
        }

        for entry in entries {
            if cancel.is_cancelled() {
                return Err(DumpError::Cancelled);
            }
            let Some(object) = entry.descriptor() else {
                debug!(
                    "Skipping {}.{} of unsupported kind {}",
                    database, entry.name, entry.table_type
                );
                summary.skipped += 1;
                continue;
            };

            match object.kind {
                TableKind::Table => {
                    self.dump_table(out, database, &object, summary).await?;
                    summary.tables += 1;
                }
                TableKind::View => {
                    self.dump_view(out, database, &object).await?;
                    summary.views += 1;
                }
            }
        }
        Ok(())
    }

    /// All objects of `database`, or the named tables in the given order.
    async fn select_objects(&mut self, database: &str) -> Result<Vec<CatalogEntry>> {
        if self.options.tables.is_empty() {
            return self.source.list_tables(database).await;
        }

        let mut entries = Vec::with_capacity(self.options.tables.len());
        for table in &self.options.tables {
            match self.source.table_entry(database, table).await? {
                Some(entry) => entries.push(entry),
                None => {
                    return Err(DumpError::metadata(
                        format!("looking up {}.{}", database, table),
                        "table does not exist",
                    ))
                }
            }
        }
        Ok(entries)
    }

    async fn dump_table<W>(
        &mut self,
        out: &mut DumpWriter<W>,
        database: &str,
        table: &TableDescriptor,
        summary: &mut DumpSummary,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let name = table.name.as_str();
        if self.options.verbose {
            info!("Dumping table {}.{}", database, name);
        } else {
            debug!("Dumping table {}.{}", database, name);
        }

        if self.options.drop_objects {
            out.write_str(&format!("DROP TABLE IF EXISTS {};\n", quote_ident(name)?))
                .await?;
        }

        let mut ddl = self.source.create_table_sql(database, name).await?;
        if !self.options.drop_objects {
            ddl = ddl.replacen("CREATE TABLE", "CREATE TABLE IF NOT EXISTS", 1);
        }
        out.write_str(&section_banner(&format!("Table structure for {}", name)))
            .await?;
        out.write_str(&ddl).await?;
        out.write_str(";\n\n").await?;

        if self.options.include_data && table.kind.has_rows() {
            self.dump_rows(out, database, name, summary)
                .await
                .map_err(|e| DumpError::table_data(name, e))?;
        }

        let triggers = self
            .triggers
            .triggers_for(&mut self.source, database, name)
            .await?;
        let section = render_triggers(name, triggers)?;
        summary.triggers += triggers.len();
        out.write_str(&section).await
    }

    async fn dump_rows<W>(
        &mut self,
        out: &mut DumpWriter<W>,
        database: &str,
        table: &str,
        summary: &mut DumpSummary,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let columns = self.source.columns(database, table).await?;
        if columns.is_empty() {
            warn!("Table {}.{} has no insertable columns, skipping data", database, table);
            return Ok(());
        }

        out.write_str(&section_banner(&format!("Dumping data for table {}", table)))
            .await?;
        let mut emitter =
            RowBatchEmitter::new(out, table, &columns, self.options.rows_per_insert)?;
        emitter.begin().await?;
        self.source
            .read_rows(database, table, &columns, &mut emitter)
            .await?;
        let totals = emitter.finish().await?;

        debug!("Wrote {} rows of {}.{}", totals.rows, database, table);
        summary.rows += totals.rows;
        summary.insert_statements += totals.statements;
        Ok(())
    }

    async fn dump_view<W>(
        &mut self,
        out: &mut DumpWriter<W>,
        database: &str,
        view: &TableDescriptor,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let name = view.name.as_str();
        debug!("Dumping view {}.{}", database, name);

        if self.options.drop_objects {
            out.write_str(&format!("DROP VIEW IF EXISTS {};\n", quote_ident(name)?))
                .await?;
        }

        let ddl = self.source.create_view_sql(database, name).await?;
        out.write_str(&section_banner(&format!("View structure for {}", name)))
            .await?;
        out.write_str(&ddl).await?;
        out.write_str(";\n\n").await
    }
}
