//! PostgreSQL record store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::{Config as PgConfig, NoTls, Row};
use tracing::{debug, info};

use super::tls::{driver_datasource, SslMode};
use super::{select_records_sql, AppliedRecord, RecordStore};
use crate::error::{MigrateError, Result};

const BACKEND: &str = "postgres";

/// Record store reading the record table over a small deadpool pool.
pub struct PostgresRecordStore {
    pool: Pool,
    table: String,
}

impl PostgresRecordStore {
    /// Connect using a libpq key/value string or a `postgres://` URL.
    ///
    /// `sslmode=require` and the `verify-*` modes connect over rustls;
    /// other modes connect in plain text. `table` must already be quoted
    /// (see [`crate::identifier::qualify`]).
    pub async fn connect(datasource: &str, table: String) -> Result<Self> {
        let ssl_mode = SslMode::from_datasource(datasource)?;
        let pg_config: PgConfig = driver_datasource(datasource)
            .parse()
            .map_err(|e| MigrateError::Config(format!("Invalid postgres datasource: {}", e)))?;

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = match ssl_mode.connector()? {
            Some(tls) => Manager::from_config(pg_config.clone(), tls, mgr_config),
            None => Manager::from_config(pg_config.clone(), NoTls, mgr_config),
        };
        let pool = Pool::builder(mgr)
            .max_size(1)
            .build()
            .map_err(|e| MigrateError::pool(e, "building PostgreSQL pool"))?;

        // Fail here rather than at query time so connection errors are reported as such
        let client = pool
            .get()
            .await
            .map_err(|e| MigrateError::pool(e, "connecting to PostgreSQL"))?;
        client.simple_query("SELECT 1").await?;

        info!(
            "Connected to PostgreSQL: {:?}/{} (sslmode={:?})",
            pg_config.get_hosts(),
            pg_config.get_dbname().unwrap_or_default(),
            ssl_mode
        );

        Ok(Self { pool, table })
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn applied_records(&self) -> Result<Vec<AppliedRecord>> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| MigrateError::pool(e, "getting PostgreSQL connection"))?;

        let sql = select_records_sql(&self.table, "applied_at");
        let rows = client.query(sql.as_str(), &[]).await?;
        debug!("Read {} applied records from {}", rows.len(), self.table);

        rows.iter().map(record_from_row).collect()
    }

    fn backend_type(&self) -> &'static str {
        BACKEND
    }
}

fn record_from_row(row: &Row) -> Result<AppliedRecord> {
    let id: String = row.try_get(0)?;
    let applied_at = timestamp_or_naive(row.try_get::<_, DateTime<Utc>>(1), || {
        row.try_get::<_, NaiveDateTime>(1)
    })?;
    Ok(AppliedRecord { id, applied_at })
}

/// `applied_at` is `timestamptz` when the table was created by the migration
/// tool; plain `timestamp` columns are read as UTC.
fn timestamp_or_naive<E, F>(
    with_tz: std::result::Result<DateTime<Utc>, E>,
    naive: F,
) -> std::result::Result<DateTime<Utc>, E>
where
    F: FnOnce() -> std::result::Result<NaiveDateTime, E>,
{
    match with_tz {
        Ok(ts) => Ok(ts),
        Err(_) => naive().map(|ts| ts.and_utc()),
    }
}
