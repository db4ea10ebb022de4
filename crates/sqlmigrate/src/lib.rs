//! # sqlmigrate
//!
//! Migration status reporting for SQL databases.
//!
//! Given a directory of `.sql` migration files and the table recording which
//! migrations were applied, this library reports, in execution order, whether
//! each migration has been applied and when:
//!
//! - **Catalog** discovery of migration files with version-aware ordering
//! - **Record stores** for PostgreSQL, MySQL, SQL Server and SQLite
//! - **Reconciliation** of the two, flagging records with no migration file
//! - **Rendering** as a bordered table or JSON
//!
//! ## Example
//!
//! ```rust,no_run
//! use sqlmigrate::{render, DbConfig, OutputFormat, StatusCommand};
//!
//! #[tokio::main]
//! async fn main() -> sqlmigrate::Result<()> {
//!     let config = DbConfig::load("dbconfig.yml")?;
//!     let env = config.environment("development")?;
//!     let status = StatusCommand::from_environment(&env).await?.run().await?;
//!     print!("{}", render(&status.entries, OutputFormat::Table)?);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod identifier;
pub mod records;
pub mod status;

// Re-exports for convenient access
pub use catalog::{FileCatalog, Migration, MigrationSource, StaticCatalog};
pub use config::{DbConfig, Dialect, Environment};
pub use error::{MigrateError, Result};
pub use records::{AppliedRecord, MemoryRecordStore, RecordStore};
pub use status::{reconcile, render, OutputFormat, Reconciliation, StatusCommand, StatusEntry};
