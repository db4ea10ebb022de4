//! Error types for the migration status library.

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for configuration errors (bad YAML, unknown environment, ...).
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for record store failures (connect, query, decode).
pub const EXIT_STORE_ERROR: u8 = 2;
/// Exit code for migration catalog failures.
pub const EXIT_CATALOG_ERROR: u8 = 3;
/// Exit code for a duplicate identifier in the catalog.
pub const EXIT_DUPLICATE_ERROR: u8 = 4;
/// Exit code for output encoding failures.
pub const EXIT_OUTPUT_ERROR: u8 = 5;
/// Exit code for I/O errors (missing config file, etc.).
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for migration status operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, unknown environment)
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Migration directory could not be read
    #[error("Could not read migrations from {dir}: {message}")]
    Catalog { dir: PathBuf, message: String },

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// Record store failure that is not a driver error
    #[error("{backend} record store error: {message}")]
    Store {
        backend: &'static str,
        message: String,
    },

    /// PostgreSQL connection or query error
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// SQL Server connection or query error
    #[error("SQL Server error: {0}")]
    Mssql(#[from] tiberius::error::Error),

    /// MySQL connection or query error
    #[cfg(feature = "mysql")]
    #[error("MySQL error: {0}")]
    Mysql(#[from] mysql_async::Error),

    /// SQLite open or query error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The catalog declares the same migration twice
    #[error("Duplicate migration identifier in catalog: {0}")]
    DuplicateIdentifier(String),
}

impl MigrateError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl ToString, context: impl Into<String>) -> Self {
        MigrateError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Store error for the named backend
    pub fn store(backend: &'static str, message: impl Into<String>) -> Self {
        MigrateError::Store {
            backend,
            message: message.into(),
        }
    }

    /// Create a Catalog error for a migration directory
    pub fn catalog(dir: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        MigrateError::Catalog {
            dir: dir.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) => EXIT_CONFIG_ERROR,
            MigrateError::Io(_) => EXIT_IO_ERROR,
            MigrateError::Json(_) => EXIT_OUTPUT_ERROR,
            MigrateError::Catalog { .. } => EXIT_CATALOG_ERROR,
            MigrateError::DuplicateIdentifier(_) => EXIT_DUPLICATE_ERROR,
            MigrateError::Pool { .. }
            | MigrateError::Store { .. }
            | MigrateError::Postgres(_)
            | MigrateError::Mssql(_)
            | MigrateError::Sqlite(_) => EXIT_STORE_ERROR,
            #[cfg(feature = "mysql")]
            MigrateError::Mysql(_) => EXIT_STORE_ERROR,
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

/// Result type alias for migration status operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
