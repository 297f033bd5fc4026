//! Configuration validation.

use super::Config;
use crate::core::identifier::validate_identifier;
use crate::error::{DumpError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Connection validation
    if config.connection.host.is_empty() {
        return Err(DumpError::Config("connection.host is required".into()));
    }
    if config.connection.user.is_empty() {
        return Err(DumpError::Config("connection.user is required".into()));
    }
    if config.connection.port == 0 {
        return Err(DumpError::Config("connection.port must be non-zero".into()));
    }
    if let Some(db) = &config.connection.database {
        validate_identifier(db)?;
    }

    // Dump validation
    let dump = &config.dump;
    if dump.rows_per_insert == 0 {
        return Err(DumpError::Config(
            "dump.rows_per_insert must be at least 1".into(),
        ));
    }
    if dump.all_databases && !dump.databases.is_empty() {
        return Err(DumpError::Config(
            "dump.databases cannot be combined with dump.all_databases".into(),
        ));
    }
    if dump.all_databases && !dump.tables.is_empty() {
        return Err(DumpError::Config(
            "dump.tables cannot be combined with dump.all_databases".into(),
        ));
    }
    if !dump.tables.is_empty() && dump.databases.len() > 1 {
        return Err(DumpError::Config(
            "dump.tables requires exactly one database".into(),
        ));
    }
    for name in dump.databases.iter().chain(&dump.tables) {
        validate_identifier(name)?;
    }

    // Restore validation
    if config.restore.merge_inserts == 0 {
        return Err(DumpError::Config(
            "restore.merge_inserts must be at least 1".into(),
        ));
    }

    Ok(())
}
