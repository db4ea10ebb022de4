//! Identifier validation and quoting for the record table name.
//!
//! The record table and its schema come from the config file and end up in
//! dynamic SQL, since identifiers cannot be bound as query parameters. They
//! are validated and then quoted with the dialect's own quoting rules.

use crate::config::Dialect;
use crate::error::{MigrateError, Result};

/// Maximum identifier length (conservative limit across databases).
/// - PostgreSQL: 63 bytes
/// - SQL Server: 128 characters
/// - MySQL: 64 characters
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier.
///
/// Rejects empty identifiers, identifiers containing null bytes and
/// identifiers longer than [`MAX_IDENTIFIER_LENGTH`].
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(MigrateError::Config(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::Config(format!(
            "Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Quote an identifier for the given dialect.
///
/// ```ignore
/// assert_eq!(quote(Dialect::Postgres, "gorp_migrations")?, "\"gorp_migrations\"");
/// assert_eq!(quote(Dialect::Mysql, "odd`name")?, "`odd``name`");
/// assert_eq!(quote(Dialect::Mssql, "odd]name")?, "[odd]]name]");
/// ```
pub fn quote(dialect: Dialect, name: &str) -> Result<String> {
    validate_identifier(name)?;
    let quoted = match dialect {
        Dialect::Postgres | Dialect::Sqlite3 => format!("\"{}\"", name.replace('"', "\"\"")),
        Dialect::Mysql => format!("`{}`", name.replace('`', "``")),
        Dialect::Mssql => format!("[{}]", name.replace(']', "]]")),
    };
    Ok(quoted)
}

/// Quote a table name, qualified with its schema when one is set.
pub fn qualify(dialect: Dialect, schema: Option<&str>, table: &str) -> Result<String> {
    match schema {
        Some(schema) => Ok(format!(
            "{}.{}",
            quote(dialect, schema)?,
            quote(dialect, table)?
        )),
        None => quote(dialect, table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty() {
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn test_validate_rejects_null_byte() {
        assert!(validate_identifier("gorp\0migrations").is_err());
    }

    #[test]
    fn test_validate_length_limit() {
        assert!(validate_identifier(&"a".repeat(128)).is_ok());
        assert!(validate_identifier(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_quote_per_dialect() {
        assert_eq!(quote(Dialect::Postgres, "gorp_migrations").unwrap(), "\"gorp_migrations\"");
        assert_eq!(quote(Dialect::Sqlite3, "gorp_migrations").unwrap(), "\"gorp_migrations\"");
        assert_eq!(quote(Dialect::Mysql, "gorp_migrations").unwrap(), "`gorp_migrations`");
        assert_eq!(quote(Dialect::Mssql, "gorp_migrations").unwrap(), "[gorp_migrations]");
    }

    #[test]
    fn test_quote_escapes_delimiters() {
        assert_eq!(quote(Dialect::Postgres, "a\"b").unwrap(), "\"a\"\"b\"");
        assert_eq!(quote(Dialect::Mysql, "a`b").unwrap(), "`a``b`");
        assert_eq!(quote(Dialect::Mssql, "a]b").unwrap(), "[a]]b]");
    }

    #[test]
    fn test_qualify_with_and_without_schema() {
        assert_eq!(
            qualify(Dialect::Postgres, Some("ops"), "gorp_migrations").unwrap(),
            "\"ops\".\"gorp_migrations\""
        );
        assert_eq!(
            qualify(Dialect::Mssql, Some("dbo"), "gorp_migrations").unwrap(),
            "[dbo].[gorp_migrations]"
        );
        assert_eq!(
            qualify(Dialect::Mysql, None, "gorp_migrations").unwrap(),
            "`gorp_migrations`"
        );
    }
}
