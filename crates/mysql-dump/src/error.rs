//! Error types for the dump and restore library.

use thiserror::Error;

/// Longest statement fragment quoted back in an error message.
const MAX_FRAGMENT_LEN: usize = 120;

/// Main error type for dump and restore operations.
#[derive(Error, Debug)]
pub enum DumpError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection could not be established or negotiated
    #[error("Connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// Catalog enumeration (databases, tables, columns, triggers) failed
    #[error("Metadata query failed while {context}: {message}")]
    Metadata { context: String, message: String },

    /// Column type has no formatting rule
    #[error("Unsupported type {type_name} for column {column} in table {table}")]
    UnsupportedType {
        table: String,
        column: String,
        type_name: String,
    },

    /// Driver value does not fit the declared column type
    #[error("Column {column} of type {column_type}: cannot format {value_kind} value")]
    ValueMismatch {
        column: String,
        column_type: String,
        value_kind: String,
    },

    /// Data export for a table failed
    #[error("Data export failed for table {table}: {source}")]
    TableData {
        table: String,
        #[source]
        source: Box<DumpError>,
    },

    /// Restore stream contained a statement the reader cannot handle
    #[error("Malformed statement: {message} (near `{fragment}`)")]
    MalformedStatement { message: String, fragment: String },

    /// Target engine rejected a statement
    #[error("Statement execution failed: {message} (statement `{fragment}`)")]
    Execution { message: String, fragment: String },

    /// Driver error without more specific context
    #[error("MySQL error: {0}")]
    Mysql(#[from] mysql_async::Error),

    /// Gzip stage failed
    #[error("Compression error: {0}")]
    Compression(String),

    /// IO error (file operations, output sink)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Operation was cancelled (SIGINT, etc.)
    #[error("Operation cancelled")]
    Cancelled,
}

impl DumpError {
    /// Create a Connection error with context about where it occurred
    pub fn connection(message: impl ToString, context: impl Into<String>) -> Self {
        DumpError::Connection {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Metadata error
    pub fn metadata(context: impl Into<String>, message: impl ToString) -> Self {
        DumpError::Metadata {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a MalformedStatement error quoting the start of the statement
    pub fn malformed(message: impl Into<String>, statement: &str) -> Self {
        DumpError::MalformedStatement {
            message: message.into(),
            fragment: fragment(statement),
        }
    }

    /// Create an Execution error quoting the start of the statement
    pub fn execution(message: impl ToString, statement: &str) -> Self {
        DumpError::Execution {
            message: message.to_string(),
            fragment: fragment(statement),
        }
    }

    /// Wrap an error raised while exporting rows of `table`.
    pub fn table_data(table: impl Into<String>, source: DumpError) -> Self {
        DumpError::TableData {
            table: table.into(),
            source: Box::new(source),
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            DumpError::Config(_) | DumpError::Yaml(_) => 2,
            DumpError::Connection { .. } => 3,
            DumpError::Cancelled => 130,
            _ => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Truncate a statement for display, on a char boundary.
fn fragment(statement: &str) -> String {
    let statement = statement.trim();
    match statement.char_indices().nth(MAX_FRAGMENT_LEN) {
        Some((idx, _)) => format!("{}...", &statement[..idx]),
        None => statement.to_string(),
    }
}

/// Result type alias for dump and restore operations.
pub type Result<T> = std::result::Result<T, DumpError>;
