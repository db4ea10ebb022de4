//! Configuration validation.

use super::{Dialect, Environment};
use crate::error::{MigrateError, Result};
use crate::identifier::validate_identifier;

/// Validate one environment and return its dialect.
pub fn validate(name: &str, env: &Environment) -> Result<Dialect> {
    let dialect: Dialect = env.dialect.parse()?;

    if env.datasource.trim().is_empty() {
        return Err(MigrateError::Config(format!(
            "No data source specified for environment '{}'",
            name
        )));
    }
    if env.dir.as_os_str().is_empty() {
        return Err(MigrateError::Config(format!(
            "No migration directory specified for environment '{}'",
            name
        )));
    }

    validate_identifier(&env.table)?;
    if let Some(schema) = &env.schema {
        validate_identifier(schema)?;
    }

    Ok(dialect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn valid_env() -> Environment {
        Environment {
            dialect: "postgres".to_string(),
            datasource: "host=localhost dbname=app user=app password=secret".to_string(),
            dir: PathBuf::from("migrations"),
            table: "gorp_migrations".to_string(),
            schema: None,
        }
    }

    #[test]
    fn test_valid_environment() {
        assert_eq!(validate("development", &valid_env()).unwrap(), Dialect::Postgres);
    }

    #[test]
    fn test_missing_dialect() {
        let mut env = valid_env();
        env.dialect = String::new();
        let err = validate("development", &env).unwrap_err();
        assert!(err.to_string().contains("No dialect specified"));
    }

    #[test]
    fn test_unsupported_dialect() {
        let mut env = valid_env();
        env.dialect = "oracle".to_string();
        let err = validate("development", &env).unwrap_err();
        assert!(err.to_string().contains("Unsupported dialect: oracle"));
    }

    #[test]
    fn test_missing_datasource() {
        let mut env = valid_env();
        env.datasource = "  ".to_string();
        let err = validate("production", &env).unwrap_err();
        assert!(err.to_string().contains("No data source specified"));
        assert!(err.to_string().contains("production"));
    }

    #[test]
    fn test_empty_table_rejected() {
        let mut env = valid_env();
        env.table = String::new();
        assert!(validate("development", &env).is_err());
    }

    #[test]
    fn test_schema_with_null_byte_rejected() {
        let mut env = valid_env();
        env.schema = Some("pub\0lic".to_string());
        assert!(validate("development", &env).is_err());
    }

    #[test]
    fn test_dialect_aliases() {
        for (raw, expected) in [
            ("postgres", Dialect::Postgres),
            ("PostgreSQL", Dialect::Postgres),
            ("mysql", Dialect::Mysql),
            ("mssql", Dialect::Mssql),
            ("sqlite3", Dialect::Sqlite3),
        ] {
            let mut env = valid_env();
            env.dialect = raw.to_string();
            assert_eq!(validate("development", &env).unwrap(), expected);
        }
    }

    #[test]
    fn test_environment_debug_redacts_datasource() {
        let mut env = valid_env();
        env.datasource = "host=db password=super_secret_password_123".to_string();
        let debug_output = format!("{:?}", env);
        assert!(
            debug_output.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
        assert!(
            !debug_output.contains("super_secret_password_123"),
            "Debug output should not contain actual password value"
        );
    }
}
