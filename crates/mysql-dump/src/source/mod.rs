//! Where dumped data comes from.
//!
//! [`DumpSource`] is the seam between the dump orchestrator and the server:
//! catalog enumeration, DDL text and row streaming. [`MysqlSource`] is the
//! live implementation; tests drive the orchestrator with in-memory fakes.

mod mysql;

pub use mysql::MysqlSource;

use async_trait::async_trait;

use crate::core::{CatalogEntry, ColumnMeta, SqlValue, TriggerRecord};
use crate::error::Result;

/// Receives rows one at a time while a table is being read.
#[async_trait]
pub trait RowSink: Send {
    /// Accept one row, values in column order.
    async fn row(&mut self, row: Vec<SqlValue<'static>>) -> Result<()>;
}

/// Catalog and row access for one dump session.
///
/// All methods run on a single connection and are called sequentially.
#[async_trait]
pub trait DumpSource: Send {
    /// Server address shown in the dump header.
    fn host(&self) -> &str;

    /// Server version string (`SELECT VERSION()`).
    async fn server_version(&mut self) -> Result<String>;

    /// All user databases, system schemas excluded.
    async fn list_databases(&mut self) -> Result<Vec<String>>;

    /// Make `database` the session's current database.
    async fn use_database(&mut self, database: &str) -> Result<()>;

    /// Tables and views of `database`, ordered by name.
    async fn list_tables(&mut self, database: &str) -> Result<Vec<CatalogEntry>>;

    /// Catalog entry for a single named object, `None` if it does not exist.
    async fn table_entry(&mut self, database: &str, table: &str) -> Result<Option<CatalogEntry>>;

    /// `CREATE TABLE` statement as the server prints it.
    async fn create_table_sql(&mut self, database: &str, table: &str) -> Result<String>;

    /// `CREATE VIEW` statement as the server prints it.
    async fn create_view_sql(&mut self, database: &str, view: &str) -> Result<String>;

    /// Insertable columns of `table` in ordinal order (generated columns
    /// excluded).
    async fn columns(&mut self, database: &str, table: &str) -> Result<Vec<ColumnMeta>>;

    /// Stream every row of `table`, restricted to `columns`, into `sink`.
    ///
    /// Returns the number of rows delivered. The first error from the sink
    /// stops the read.
    async fn read_rows(
        &mut self,
        database: &str,
        table: &str,
        columns: &[ColumnMeta],
        sink: &mut dyn RowSink,
    ) -> Result<u64>;

    /// Every trigger visible to the session, across all databases.
    async fn list_triggers(&mut self) -> Result<Vec<TriggerRecord>>;
}
