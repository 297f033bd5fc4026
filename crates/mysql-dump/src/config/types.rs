//! Configuration type definitions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server connection settings.
    pub connection: ConnectionConfig,

    /// Dump behavior.
    #[serde(default)]
    pub dump: DumpOptions,

    /// Restore behavior.
    #[serde(default)]
    pub restore: RestoreOptions,
}

/// MySQL server connection.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Server host.
    pub host: String,

    /// Server port (default: 3306).
    #[serde(default = "default_mysql_port")]
    pub port: u16,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// Default database selected on connect, and the `USE` target on restore.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("database", &self.database)
            .finish()
    }
}

/// Gzip compression level for the dump file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionLevel {
    /// Fastest compression (`fast`/`min` in older configs).
    #[serde(alias = "fast", alias = "min")]
    Fastest,

    /// Smallest output (`max` in older configs).
    #[serde(alias = "max")]
    Best,

    /// zlib's default trade-off.
    #[default]
    Default,
}

impl CompressionLevel {
    /// Level for `flate2`.
    pub fn to_flate2(self) -> flate2::Compression {
        match self {
            CompressionLevel::Fastest => flate2::Compression::fast(),
            CompressionLevel::Best => flate2::Compression::best(),
            CompressionLevel::Default => flate2::Compression::default(),
        }
    }
}

/// Dump behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpOptions {
    /// Databases to dump. Empty means the connection's default database.
    #[serde(default)]
    pub databases: Vec<String>,

    /// Dump every non-system database on the server.
    #[serde(default)]
    pub all_databases: bool,

    /// Tables (and views) to dump. Empty means all.
    #[serde(default)]
    pub tables: Vec<String>,

    /// Emit row data (default: true).
    #[serde(default = "default_true")]
    pub include_data: bool,

    /// Emit `DROP TABLE/VIEW IF EXISTS` before each structure.
    #[serde(default)]
    pub drop_objects: bool,

    /// Emit `USE` even for a single database.
    #[serde(default)]
    pub use_database: bool,

    /// Rows per `INSERT` statement (default: 1).
    #[serde(default = "default_one")]
    pub rows_per_insert: usize,

    /// Output file. Standard output when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Gzip the output file when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<CompressionLevel>,

    /// Log each table as it is dumped.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            databases: Vec::new(),
            all_databases: false,
            tables: Vec::new(),
            include_data: true,
            drop_objects: false,
            use_database: false,
            rows_per_insert: 1,
            output: None,
            compression: None,
            verbose: false,
        }
    }
}

/// How consecutive `INSERT` statements are combined on restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Parse target, column list and tuples; only merge matching inserts.
    #[default]
    Structural,

    /// Append everything after `VALUES` without checking column lists.
    Splice,
}

/// Restore behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreOptions {
    /// Parse and count statements without executing them.
    #[serde(default)]
    pub dry_run: bool,

    /// Maximum `INSERT` statements merged into one (default: 1, no merging).
    #[serde(default = "default_one")]
    pub merge_inserts: usize,

    /// Merge mechanism (default: structural).
    #[serde(default)]
    pub merge_mode: MergeMode,

    /// Log each executed statement.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            merge_inserts: 1,
            merge_mode: MergeMode::Structural,
            verbose: false,
        }
    }
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_one() -> usize {
    1
}

fn default_true() -> bool {
    true
}
