//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::MigrateError;

/// Root configuration: environment name to environment settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DbConfig {
    pub environments: BTreeMap<String, Environment>,
}

/// One named target database.
#[derive(Clone, Serialize, Deserialize)]
pub struct Environment {
    /// SQL dialect of the target database.
    #[serde(default)]
    pub dialect: String,

    /// Connection string, with `$VAR` / `${VAR}` references.
    #[serde(default)]
    pub datasource: String,

    /// Directory holding the `.sql` migration files (default: "migrations").
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Table holding applied records (default: "gorp_migrations").
    #[serde(default = "default_table")]
    pub table: String,

    /// Schema of the record table, if not the connection default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("dialect", &self.dialect)
            .field("datasource", &"[REDACTED]")
            .field("dir", &self.dir)
            .field("table", &self.table)
            .field("schema", &self.schema)
            .finish()
    }
}

/// Supported database dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Mysql,
    Mssql,
    Sqlite3,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
            Dialect::Mssql => "mssql",
            Dialect::Sqlite3 => "sqlite3",
        }
    }
}

impl FromStr for Dialect {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::Mysql),
            "mssql" | "sqlserver" => Ok(Dialect::Mssql),
            "sqlite3" | "sqlite" => Ok(Dialect::Sqlite3),
            "" => Err(MigrateError::Config("No dialect specified".into())),
            other => Err(MigrateError::Config(format!(
                "Unsupported dialect: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Default value functions for serde
fn default_dir() -> PathBuf {
    PathBuf::from("migrations")
}

fn default_table() -> String {
    "gorp_migrations".to_string()
}
