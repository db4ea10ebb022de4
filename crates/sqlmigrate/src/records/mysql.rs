//! MySQL record store.
//!
//! Datasources may be written either as a `mysql://` URL or in the Go driver
//! DSN form used by existing `dbconfig.yml` files:
//! `user:password@tcp(host:port)/dbname?parseTime=true`.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Opts, Pool, Row};
use tracing::debug;

use super::{record_from_text, select_records_sql, AppliedRecord, RecordStore};
use crate::error::{MigrateError, Result};

const BACKEND: &str = "mysql";

/// `applied_at` is converted to text server-side so DATETIME and TIMESTAMP
/// columns decode the same way.
const APPLIED_AT_EXPR: &str = "DATE_FORMAT(applied_at, '%Y-%m-%d %H:%i:%s.%f')";

/// Record store backed by a `mysql_async` pool.
pub struct MysqlRecordStore {
    pool: Pool,
    table: String,
}

impl MysqlRecordStore {
    /// Create the store. Connections are opened lazily on first query.
    pub fn new(datasource: &str, table: String) -> Result<Self> {
        let url = mysql_url(datasource)?;
        let opts = Opts::from_url(&url)
            .map_err(|e| MigrateError::Config(format!("Invalid mysql datasource: {}", e)))?;
        Ok(Self {
            pool: Pool::new(opts),
            table,
        })
    }
}

#[async_trait]
impl RecordStore for MysqlRecordStore {
    async fn applied_records(&self) -> Result<Vec<AppliedRecord>> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| MigrateError::pool(e, "getting MySQL connection"))?;

        let sql = select_records_sql(&self.table, APPLIED_AT_EXPR);
        let rows: Vec<Row> = conn.query(sql).await?;
        debug!("Read {} applied records from {}", rows.len(), self.table);

        rows.iter().map(record_from_row).collect()
    }

    fn backend_type(&self) -> &'static str {
        BACKEND
    }
}

fn record_from_row(row: &Row) -> Result<AppliedRecord> {
    let id = match row.get_opt::<String, _>(0) {
        Some(Ok(id)) => Some(id),
        _ => None,
    };
    let applied_at = match row.get_opt::<Option<String>, _>(1) {
        Some(Ok(value)) => value,
        _ => None,
    };
    record_from_text(BACKEND, id.as_deref(), applied_at.as_deref())
}

/// Convert a datasource to a `mysql://` URL.
///
/// URLs are returned unchanged. Go-style DSNs are rewritten; their query
/// parameters (`parseTime`, `charset`, ...) only make sense to the Go driver
/// and are dropped. Unix socket addresses are not supported.
pub fn mysql_url(datasource: &str) -> Result<String> {
    let datasource = datasource.trim();
    if datasource.starts_with("mysql://") {
        return Ok(datasource.to_string());
    }

    let (head, tail) = datasource.rsplit_once('/').ok_or_else(|| {
        MigrateError::Config(format!(
            "Invalid mysql datasource, missing '/dbname': {}",
            redact(datasource)
        ))
    })?;
    let dbname = tail.split_once('?').map_or(tail, |(db, _)| db);

    let (userinfo, address) = match head.rsplit_once('@') {
        Some((userinfo, address)) => (Some(userinfo), address),
        None => (None, head),
    };

    let host = match address {
        "" | "tcp" => "localhost:3306".to_string(),
        addr if addr.starts_with("tcp(") && addr.ends_with(')') => {
            let inner = &addr[4..addr.len() - 1];
            if inner.is_empty() {
                "localhost:3306".to_string()
            } else if inner.contains(':') {
                inner.to_string()
            } else {
                format!("{}:3306", inner)
            }
        }
        other => {
            return Err(MigrateError::Config(format!(
                "Unsupported mysql address '{}': only tcp(host:port) is supported",
                other
            )))
        }
    };

    let credentials = match userinfo {
        Some(userinfo) => {
            let (user, password) = match userinfo.split_once(':') {
                Some((user, password)) => (user, Some(password)),
                None => (userinfo, None),
            };
            match password {
                Some(password) => format!("{}:{}@", encode(user), encode(password)),
                None => format!("{}@", encode(user)),
            }
        }
        None => String::new(),
    };

    Ok(format!("mysql://{}{}/{}", credentials, host, encode(dbname)))
}

/// Percent-encode everything outside the URL unreserved set.
fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn redact(datasource: &str) -> String {
    match datasource.rsplit_once('@') {
        Some((_, rest)) => format!("[REDACTED]@{}", rest),
        None => datasource.to_string(),
    }
}
