//! Migration status: which declared migrations have been applied.
//!
//! [`StatusCommand`] pulls the declared migrations from a
//! [`MigrationSource`] and the applied records from a [`RecordStore`], then
//! hands both to [`reconcile`]. Rendering lives in [`present`].

pub mod present;
mod reconcile;

pub use present::{render, OutputFormat};
pub use reconcile::{reconcile, Reconciliation, StatusEntry};

use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::{FileCatalog, MigrationSource};
use crate::config::Environment;
use crate::error::Result;
use crate::records::{self, RecordStore};

/// Status report driver for one environment.
pub struct StatusCommand {
    source: Box<dyn MigrationSource>,
    store: Arc<dyn RecordStore>,
}

impl StatusCommand {
    pub fn new(source: Box<dyn MigrationSource>, store: Arc<dyn RecordStore>) -> Self {
        Self { source, store }
    }

    /// Migrations from the environment's `dir`, records from its database.
    pub async fn from_environment(env: &Environment) -> Result<Self> {
        let store = records::connect(env).await?;
        Ok(Self::new(Box::new(FileCatalog::new(&env.dir)), store))
    }

    pub async fn run(&self) -> Result<Reconciliation> {
        let migrations = self.source.find_migrations()?;
        let ids: Vec<&str> = migrations.iter().map(|m| m.id.as_str()).collect();

        let records = self.store.applied_records().await?;
        let result = reconcile(&ids, &records)?;

        for id in &result.orphans {
            warn!("Could not find migration file: {}", id);
        }
        for id in &result.duplicate_records {
            warn!(
                "Migration {} has more than one applied record, showing the last one",
                id
            );
        }

        info!(
            "{} migrations, {} applied, {} pending ({} backend)",
            result.entries.len(),
            result.applied_count(),
            result.pending_count(),
            self.store.backend_type()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::error::MigrateError;
    use crate::records::{AppliedRecord, MemoryRecordStore};
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::TempDir;

    fn command(ids: &[&str], records: Vec<AppliedRecord>) -> StatusCommand {
        StatusCommand::new(
            Box::new(StaticCatalog::new(ids.iter().copied())),
            Arc::new(MemoryRecordStore::new(records)),
        )
    }

    #[tokio::test]
    async fn test_run_reconciles_catalog_and_records() {
        let applied = Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).unwrap();
        let cmd = command(
            &["1_init.sql", "2_users.sql"],
            vec![
                AppliedRecord::new("1_init.sql", applied),
                AppliedRecord::new("9_gone.sql", applied),
            ],
        );

        let result = cmd.run().await.unwrap();

        assert_eq!(result.entries.len(), 2);
        assert!(result.entries[0].applied);
        assert_eq!(result.entries[0].applied_at, Some(applied));
        assert!(!result.entries[1].applied);
        assert_eq!(result.orphans, vec!["9_gone.sql"]);
    }

    #[tokio::test]
    async fn test_run_propagates_duplicate_catalog_error() {
        let cmd = command(&["1_a.sql", "1_a.sql"], vec![]);
        let err = cmd.run().await.unwrap_err();
        assert!(matches!(err, MigrateError::DuplicateIdentifier(_)));
    }

    #[tokio::test]
    async fn test_run_over_file_catalog() {
        let dir = TempDir::new().unwrap();
        for name in ["10_c.sql", "2_b.sql", "1_a.sql", "notes.txt"] {
            fs::write(dir.path().join(name), "-- +migrate Up\n").unwrap();
        }

        let cmd = StatusCommand::new(
            Box::new(FileCatalog::new(dir.path())),
            Arc::new(MemoryRecordStore::default()),
        );
        let result = cmd.run().await.unwrap();

        let ids: Vec<&str> = result.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1_a.sql", "2_b.sql", "10_c.sql"]);
        assert_eq!(result.pending_count(), 3);
    }

    #[tokio::test]
    async fn test_run_missing_dir_is_catalog_error() {
        let dir = TempDir::new().unwrap();
        let cmd = StatusCommand::new(
            Box::new(FileCatalog::new(dir.path().join("missing"))),
            Arc::new(MemoryRecordStore::default()),
        );
        let err = cmd.run().await.unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CATALOG_ERROR);
    }
}
