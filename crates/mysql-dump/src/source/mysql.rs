//! Live MySQL/MariaDB source over a single `mysql_async` connection.
//!
//! Rows are read with the text protocol (`query_iter`), so numeric and
//! temporal values arrive as the server's own text and reach the formatter
//! unchanged.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Row, Value};
use tracing::{debug, info};

use super::{DumpSource, RowSink};
use crate::config::ConnectionConfig;
use crate::core::identifier::quote_ident;
use crate::core::{CatalogEntry, ColumnMeta, SqlValue, TriggerRecord};
use crate::error::{DumpError, Result};

/// Schemas that belong to the server itself and are never dumped.
const SYSTEM_SCHEMAS: &[&str] = &["information_schema", "performance_schema", "mysql", "sys"];

/// MySQL source bound to one connection.
pub struct MysqlSource {
    conn: Conn,
    host: String,
}

impl MysqlSource {
    /// Connect and verify the connection.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let host = format!("{}:{}", config.host, config.port);
        let mut conn = Conn::new(config.dump_opts())
            .await
            .map_err(|e| DumpError::connection(e, format!("connecting to {}", host)))?;

        conn.query_drop("SELECT 1")
            .await
            .map_err(|e| DumpError::connection(e, format!("testing connection to {}", host)))?;

        info!("Connected to MySQL source: {}", host);
        Ok(Self { conn, host })
    }

    /// Close the connection cleanly.
    pub async fn disconnect(self) -> Result<()> {
        self.conn.disconnect().await?;
        Ok(())
    }

    /// Second column of a `SHOW CREATE ...` row.
    async fn show_create(&mut self, database: &str, name: &str, context: &str) -> Result<String> {
        let query = format!(
            "SHOW CREATE TABLE {}.{}",
            quote_ident(database)?,
            quote_ident(name)?
        );
        let row: Option<Row> = self
            .conn
            .query_first(query)
            .await
            .map_err(|e| DumpError::metadata(context, e))?;

        let mut row = row.ok_or_else(|| DumpError::metadata(context, "no such object"))?;
        row.take_opt::<String, _>(1)
            .ok_or_else(|| DumpError::metadata(context, "missing DDL column"))?
            .map_err(|e| DumpError::metadata(context, e))
    }
}

fn take_values(mut row: Row) -> Vec<SqlValue<'static>> {
    (0..row.len())
        .map(|i| {
            row.take::<Value, _>(i)
                .map(SqlValue::from)
                .unwrap_or(SqlValue::Null)
        })
        .collect()
}

#[async_trait]
impl DumpSource for MysqlSource {
    fn host(&self) -> &str {
        &self.host
    }

    async fn server_version(&mut self) -> Result<String> {
        let version: Option<String> = self
            .conn
            .query_first("SELECT VERSION()")
            .await
            .map_err(|e| DumpError::metadata("reading server version", e))?;
        Ok(version.unwrap_or_default())
    }

    async fn list_databases(&mut self) -> Result<Vec<String>> {
        let names: Vec<String> = self
            .conn
            .query("SHOW DATABASES")
            .await
            .map_err(|e| DumpError::metadata("listing databases", e))?;

        Ok(names
            .into_iter()
            .filter(|name| !SYSTEM_SCHEMAS.contains(&name.to_lowercase().as_str()))
            .collect())
    }

    async fn use_database(&mut self, database: &str) -> Result<()> {
        self.conn
            .query_drop(format!("USE {}", quote_ident(database)?))
            .await
            .map_err(|e| DumpError::metadata(format!("selecting database {}", database), e))
    }

    async fn list_tables(&mut self, database: &str) -> Result<Vec<CatalogEntry>> {
        // CAST to CHAR: some servers report information_schema names as VARBINARY
        let query = r#"
            SELECT CAST(TABLE_NAME AS CHAR(255)), CAST(TABLE_TYPE AS CHAR(64))
            FROM INFORMATION_SCHEMA.TABLES
            WHERE TABLE_SCHEMA = ?
            ORDER BY TABLE_NAME
        "#;
        let rows: Vec<(String, String)> = self
            .conn
            .exec(query, (database,))
            .await
            .map_err(|e| DumpError::metadata(format!("listing tables of {}", database), e))?;

        debug!("Found {} catalog objects in {}", rows.len(), database);
        Ok(rows
            .into_iter()
            .map(|(name, table_type)| CatalogEntry::new(name, table_type))
            .collect())
    }

    async fn table_entry(&mut self, database: &str, table: &str) -> Result<Option<CatalogEntry>> {
        let query = r#"
            SELECT CAST(TABLE_NAME AS CHAR(255)), CAST(TABLE_TYPE AS CHAR(64))
            FROM INFORMATION_SCHEMA.TABLES
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
        "#;
        let row: Option<(String, String)> = self
            .conn
            .exec_first(query, (database, table))
            .await
            .map_err(|e| DumpError::metadata(format!("looking up {}.{}", database, table), e))?;

        Ok(row.map(|(name, table_type)| CatalogEntry::new(name, table_type)))
    }

    async fn create_table_sql(&mut self, database: &str, table: &str) -> Result<String> {
        let context = format!("reading structure of table {}", table);
        self.show_create(database, table, &context).await
    }

    async fn create_view_sql(&mut self, database: &str, view: &str) -> Result<String> {
        let context = format!("reading structure of view {}", view);
        self.show_create(database, view, &context).await
    }

    async fn columns(&mut self, database: &str, table: &str) -> Result<Vec<ColumnMeta>> {
        // Generated columns cannot be inserted; DEFAULT_GENERATED is an
        // ordinary column with an expression default.
        let query = r#"
            SELECT CAST(COLUMN_NAME AS CHAR(255)), CAST(DATA_TYPE AS CHAR(64))
            FROM INFORMATION_SCHEMA.COLUMNS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
              AND EXTRA NOT LIKE '%VIRTUAL%'
              AND EXTRA NOT LIKE '%STORED%'
              AND EXTRA NOT LIKE '%PERSISTENT%'
            ORDER BY ORDINAL_POSITION
        "#;
        let rows: Vec<(String, String)> = self
            .conn
            .exec(query, (database, table))
            .await
            .map_err(|e| DumpError::metadata(format!("loading columns of {}", table), e))?;

        Ok(rows
            .into_iter()
            .map(|(name, data_type)| ColumnMeta::new(name, data_type))
            .collect())
    }

    async fn read_rows(
        &mut self,
        database: &str,
        table: &str,
        columns: &[ColumnMeta],
        sink: &mut dyn RowSink,
    ) -> Result<u64> {
        let column_list = columns
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect::<Result<Vec<_>>>()?
            .join(",");
        let query = format!(
            "SELECT {} FROM {}.{}",
            column_list,
            quote_ident(database)?,
            quote_ident(table)?
        );

        let mut result = self
            .conn
            .query_iter(query)
            .await
            .map_err(|e| DumpError::metadata(format!("reading rows of {}", table), e))?;

        let mut delivered = 0u64;
        let outcome = loop {
            match result.next().await {
                Ok(Some(row)) => {
                    if let Err(e) = sink.row(take_values(row)).await {
                        break Err(e);
                    }
                    delivered += 1;
                }
                Ok(None) => break Ok(delivered),
                Err(e) => break Err(DumpError::from(e)),
            }
        };

        if outcome.is_err() {
            // leave the connection usable for the caller's error path
            let _ = result.drop_result().await;
        }
        outcome
    }

    async fn list_triggers(&mut self) -> Result<Vec<TriggerRecord>> {
        let query = r#"
            SELECT
                CAST(TRIGGER_SCHEMA AS CHAR(255)),
                CAST(TRIGGER_NAME AS CHAR(255)),
                CAST(EVENT_MANIPULATION AS CHAR(16)),
                CAST(ACTION_TIMING AS CHAR(16)),
                CAST(ACTION_STATEMENT AS CHAR),
                CAST(EVENT_OBJECT_TABLE AS CHAR(255))
            FROM INFORMATION_SCHEMA.TRIGGERS
            ORDER BY TRIGGER_SCHEMA, EVENT_OBJECT_TABLE, ACTION_ORDER, TRIGGER_NAME
        "#;
        let rows: Vec<(String, String, String, String, String, String)> = self
            .conn
            .query(query)
            .await
            .map_err(|e| DumpError::metadata("listing triggers", e))?;

        Ok(rows
            .into_iter()
            .map(|(database, name, event, timing, statement, table)| TriggerRecord {
                name,
                event,
                timing,
                statement,
                table,
                database,
            })
            .collect())
    }
}
