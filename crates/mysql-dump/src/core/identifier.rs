//! Identifier validation and quoting.
//!
//! Identifiers (database, table and column names) cannot be bound as
//! parameters, so every name interpolated into generated SQL goes through
//! [`quote_ident`].

use crate::error::{DumpError, Result};

/// MySQL limits identifiers to 64 characters.
const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Validate an identifier before it is interpolated into SQL.
///
/// Rejects empty names, names containing null bytes and names longer than
/// MySQL allows.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DumpError::Config("Identifier cannot be empty".to_string()));
    }

    if name.contains('\0') {
        return Err(DumpError::Config(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(DumpError::Config(format!(
            "Identifier exceeds maximum length of {} characters: {:?}",
            MAX_IDENTIFIER_LENGTH, name
        )));
    }

    Ok(())
}

/// Quote a MySQL identifier with backticks, doubling embedded backticks.
///
/// ```
/// use mysql_dump::core::identifier::quote_ident;
///
/// assert_eq!(quote_ident("users").unwrap(), "`users`");
/// assert_eq!(quote_ident("odd`name").unwrap(), "`odd``name`");
/// ```
pub fn quote_ident(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("`{}`", name.replace('`', "``")))
}
