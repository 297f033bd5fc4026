//! # mysql-dump
//!
//! Logical backup and restore for MySQL/MariaDB through plain SQL text.
//!
//! - **Dump**: walks databases, tables and views and writes executable SQL
//!   (structure, multi-row `INSERT` data, triggers) with per-type literal
//!   formatting that fails loudly on unsupported column types
//! - **Restore**: splits a SQL stream into statements (quote and
//!   `DELIMITER` aware), optionally merges runs of `INSERT` statements, and
//!   executes them in one transaction
//! - **Compression**: gzip of the finished dump file
//!
//! ## Example
//!
//! ```rust,no_run
//! use mysql_dump::{Config, Dumper, MysqlSource};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> mysql_dump::Result<()> {
//!     let config = Config::load("mysql-dump.yaml")?;
//!     let source = MysqlSource::connect(&config.connection).await?;
//!     let mut dumper = Dumper::new(source, config.dump_options());
//!
//!     let mut out = tokio::io::stdout();
//!     let summary = dumper.dump(&mut out, &CancellationToken::new()).await?;
//!     eprintln!("Dumped {} rows", summary.rows);
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod compress;
pub mod config;
pub mod core;
pub mod dump;
pub mod error;
pub mod restore;
pub mod source;

// Re-exports for convenient access
pub use config::{CompressionLevel, Config, ConnectionConfig, DumpOptions, MergeMode, RestoreOptions};
pub use dump::{DumpSummary, Dumper};
pub use error::{DumpError, Result};
pub use restore::{DryRunExecutor, MysqlExecutor, RestoreSummary, Restorer, SqlExecutor};
pub use source::{DumpSource, MysqlSource, RowSink};
