//! SQLite record store.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use super::{parse_timestamp, select_records_sql, AppliedRecord, RecordStore};
use crate::error::{MigrateError, Result};

const BACKEND: &str = "sqlite3";

/// Record store reading a SQLite database file.
///
/// The file is opened read-only for each query on the blocking thread pool.
pub struct SqliteRecordStore {
    path: PathBuf,
    table: String,
}

impl SqliteRecordStore {
    pub fn new(path: impl Into<PathBuf>, table: String) -> Self {
        Self {
            path: path.into(),
            table,
        }
    }

    fn read_records(path: PathBuf, table: String) -> Result<Vec<AppliedRecord>> {
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let sql = select_records_sql(&table, "applied_at");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Value>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, raw) = row?;
            let applied_at = decode_applied_at(&id, raw)?;
            records.push(AppliedRecord { id, applied_at });
        }

        debug!("Read {} applied records from {}", records.len(), path.display());
        Ok(records)
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn applied_records(&self) -> Result<Vec<AppliedRecord>> {
        let path = self.path.clone();
        let table = self.table.clone();
        tokio::task::spawn_blocking(move || Self::read_records(path, table))
            .await
            .map_err(|e| MigrateError::store(BACKEND, format!("Query task failed: {}", e)))?
    }

    fn backend_type(&self) -> &'static str {
        BACKEND
    }
}

/// SQLite has no timestamp type: values are TEXT or unix seconds.
fn decode_applied_at(id: &str, raw: Value) -> Result<DateTime<Utc>> {
    match raw {
        Value::Text(text) => parse_timestamp(BACKEND, &text),
        Value::Integer(secs) => DateTime::from_timestamp(secs, 0).ok_or_else(|| {
            MigrateError::store(BACKEND, format!("Record {} has out of range applied_at", id))
        }),
        other => Err(MigrateError::store(
            BACKEND,
            format!("Record {} has unsupported applied_at value {:?}", id, other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn create_db(dir: &TempDir, rows: &[(&str, &str)]) -> PathBuf {
        let path = dir.path().join("app.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "CREATE TABLE gorp_migrations (id TEXT PRIMARY KEY, applied_at DATETIME)",
            [],
        )
        .unwrap();
        for (id, applied_at) in rows {
            conn.execute(
                "INSERT INTO gorp_migrations (id, applied_at) VALUES (?1, ?2)",
                [id, applied_at],
            )
            .unwrap();
        }
        path
    }

    #[tokio::test]
    async fn test_reads_text_timestamps() {
        let dir = TempDir::new().unwrap();
        let path = create_db(
            &dir,
            &[
                ("1_init.sql", "2023-01-01 10:00:00.5+00:00"),
                ("2_users.sql", "2023-01-02T08:30:00Z"),
            ],
        );

        let store = SqliteRecordStore::new(path, "\"gorp_migrations\"".into());
        let mut records = store.applied_records().await.unwrap();
        records.sort_by(|a, b| a.id.cmp(&b.id));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "1_init.sql");
        assert_eq!(records[0].applied_at.timestamp(), 1_672_567_200);
        assert_eq!(
            records[1].applied_at,
            Utc.with_ymd_and_hms(2023, 1, 2, 8, 30, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_reads_integer_timestamps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE gorp_migrations (id TEXT PRIMARY KEY, applied_at INTEGER);
             INSERT INTO gorp_migrations VALUES ('1_init.sql', 1672567200);",
        )
        .unwrap();
        drop(conn);

        let store = SqliteRecordStore::new(path, "\"gorp_migrations\"".into());
        let records = store.applied_records().await.unwrap();
        assert_eq!(
            records[0].applied_at,
            Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_missing_table_is_error() {
        let dir = TempDir::new().unwrap();
        let path = create_db(&dir, &[]);
        let store = SqliteRecordStore::new(path, "\"other_table\"".into());
        let err = store.applied_records().await.unwrap_err();
        assert!(matches!(err, MigrateError::Sqlite(_)));
    }

    #[tokio::test]
    async fn test_missing_database_file_is_error() {
        let dir = TempDir::new().unwrap();
        let store = SqliteRecordStore::new(dir.path().join("absent.db"), "\"gorp_migrations\"".into());
        assert!(store.applied_records().await.is_err());
    }

    #[test]
    fn test_decode_rejects_null() {
        assert!(decode_applied_at("1_init.sql", Value::Null).is_err());
    }
}
