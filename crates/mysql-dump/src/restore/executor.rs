//! Statement executors for the restore side.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::Conn;
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::error::{DumpError, Result};

/// Runs one SQL statement at a time.
#[async_trait]
pub trait SqlExecutor: Send {
    async fn execute(&mut self, statement: &str) -> Result<()>;
}

/// Executes statements on a live MySQL connection.
pub struct MysqlExecutor {
    conn: Conn,
}

impl MysqlExecutor {
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let target = format!("{}:{}", config.host, config.port);
        let mut conn = Conn::new(config.opts())
            .await
            .map_err(|e| DumpError::connection(e, format!("connecting to {}", target)))?;

        conn.query_drop("SELECT 1")
            .await
            .map_err(|e| DumpError::connection(e, format!("testing connection to {}", target)))?;

        info!("Connected to MySQL target: {}", target);
        Ok(Self { conn })
    }

    pub async fn disconnect(self) -> Result<()> {
        self.conn.disconnect().await?;
        Ok(())
    }
}

#[async_trait]
impl SqlExecutor for MysqlExecutor {
    async fn execute(&mut self, statement: &str) -> Result<()> {
        self.conn
            .query_drop(statement)
            .await
            .map_err(|e| DumpError::execution(e, statement))
    }
}

/// Accepts statements without running them.
#[derive(Debug, Default)]
pub struct DryRunExecutor {
    seen: u64,
}

impl DryRunExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statements received so far.
    pub fn seen(&self) -> u64 {
        self.seen
    }
}

#[async_trait]
impl SqlExecutor for DryRunExecutor {
    async fn execute(&mut self, statement: &str) -> Result<()> {
        self.seen += 1;
        debug!(
            "[dry-run] {}",
            statement.chars().take(120).collect::<String>()
        );
        Ok(())
    }
}
