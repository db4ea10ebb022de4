//! Applied migration records.
//!
//! The [`RecordStore`] trait abstracts where the record table lives. Every
//! backend runs the same read-only query against the configured table:
//!
//! - **PostgreSQL**: [`PostgresRecordStore`] in `postgres.rs`
//! - **MySQL**: [`MysqlRecordStore`] in `mysql.rs` (feature `mysql`)
//! - **SQL Server**: [`MssqlRecordStore`] in `mssql.rs`
//! - **SQLite**: [`SqliteRecordStore`] in `sqlite.rs`
//! - **Memory**: [`MemoryRecordStore`], records supplied by the caller
//!
//! Callers hold an `Arc<dyn RecordStore>` and never see the concrete type.

mod mssql;
#[cfg(feature = "mysql")]
mod mysql;
mod postgres;
mod sqlite;
mod tls;

pub use mssql::{mssql_ado_string, MssqlRecordStore};
#[cfg(feature = "mysql")]
pub use mysql::{mysql_url, MysqlRecordStore};
pub use postgres::PostgresRecordStore;
pub use sqlite::SqliteRecordStore;
pub use tls::SslMode;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{Dialect, Environment};
use crate::error::{MigrateError, Result};
use crate::identifier::qualify;

/// Evidence that a migration was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRecord {
    /// Migration identifier.
    pub id: String,

    /// When the migration was applied.
    pub applied_at: DateTime<Utc>,
}

impl AppliedRecord {
    pub fn new(id: impl Into<String>, applied_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            applied_at,
        }
    }
}

/// Read access to the persisted record of applied migrations.
///
/// Implementations must be `Send + Sync` so a store can be shared across
/// async tasks. No ordering is promised for the returned records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch every applied record.
    async fn applied_records(&self) -> Result<Vec<AppliedRecord>>;

    /// Get the backend type name for logging/debugging.
    fn backend_type(&self) -> &'static str;
}

/// Record store backed by a caller-supplied list.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: Vec<AppliedRecord>,
}

impl MemoryRecordStore {
    pub fn new(records: Vec<AppliedRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn applied_records(&self) -> Result<Vec<AppliedRecord>> {
        Ok(self.records.clone())
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}

/// Open the record store described by an environment.
pub async fn connect(env: &Environment) -> Result<Arc<dyn RecordStore>> {
    let dialect = env.dialect_kind()?;
    let table = qualify(dialect, env.schema.as_deref(), &env.table)?;

    let store: Arc<dyn RecordStore> = match dialect {
        Dialect::Postgres => Arc::new(PostgresRecordStore::connect(&env.datasource, table).await?),
        Dialect::Mssql => Arc::new(MssqlRecordStore::new(&env.datasource, table)?),
        Dialect::Sqlite3 => Arc::new(SqliteRecordStore::new(&env.datasource, table)),
        #[cfg(feature = "mysql")]
        Dialect::Mysql => Arc::new(MysqlRecordStore::new(&env.datasource, table)?),
        #[cfg(not(feature = "mysql"))]
        Dialect::Mysql => {
            return Err(MigrateError::Config(
                "MySQL support is not enabled in this build (feature `mysql`)".into(),
            ))
        }
    };

    Ok(store)
}

/// Parse a textual `applied_at` value.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]` with an optional numeric
/// offset, and the `T`-separated naive form. Values without an offset are UTC.
pub fn parse_timestamp(backend: &'static str, value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(MigrateError::store(
        backend,
        format!("Unrecognized applied_at timestamp: {:?}", value),
    ))
}

/// Build a record from text columns, as returned by backends that convert
/// `applied_at` to text server-side.
fn record_from_text(
    backend: &'static str,
    id: Option<&str>,
    applied_at: Option<&str>,
) -> Result<AppliedRecord> {
    let id = id.ok_or_else(|| MigrateError::store(backend, "Record with NULL id"))?;
    let applied_at = applied_at.ok_or_else(|| {
        MigrateError::store(backend, format!("Record {} has no applied_at value", id))
    })?;
    Ok(AppliedRecord::new(id, parse_timestamp(backend, applied_at)?))
}

/// Read-only query used by every backend. `applied_at` is the column
/// expression, letting a backend convert the value to text server-side.
fn select_records_sql(table: &str, applied_at: &str) -> String {
    format!("SELECT id, {} FROM {}", applied_at, table)
}
