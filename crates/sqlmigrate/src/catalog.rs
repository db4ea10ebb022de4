//! Migration discovery.
//!
//! A [`MigrationSource`] yields the declared migrations in their intended
//! execution order. That order is authoritative for every status report.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{MigrateError, Result};

/// A declared migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Identifier, the migration file name (e.g. `20230101_init.sql`).
    pub id: String,
}

impl Migration {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Leading run of ASCII digits, if any.
    pub fn version_digits(&self) -> Option<&str> {
        let end = self
            .id
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.id.len());
        (end > 0).then(|| &self.id[..end])
    }

    /// Numeric version taken from the leading run of digits. `None` when
    /// there is no such run or it does not fit in a `u64`; ordering uses
    /// the digits directly and handles versions of any length.
    pub fn version(&self) -> Option<u64> {
        self.version_digits()?.parse().ok()
    }
}

/// Compare two digit runs numerically without parsing them.
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

impl Ord for Migration {
    /// Numbered migrations sort by version, before unnumbered ones; ties and
    /// unnumbered migrations fall back to the identifier.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.version_digits(), other.version_digits()) {
            (Some(a), Some(b)) => cmp_digits(a, b).then_with(|| self.id.cmp(&other.id)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.id.cmp(&other.id),
        }
    }
}

impl PartialOrd for Migration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Source of declared migrations.
pub trait MigrationSource: Send + Sync {
    /// Return the declared migrations, in execution order.
    fn find_migrations(&self) -> Result<Vec<Migration>>;
}

/// Migrations stored as `.sql` files in a directory.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    dir: PathBuf,
}

impl FileCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl MigrationSource for FileCatalog {
    fn find_migrations(&self) -> Result<Vec<Migration>> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| MigrateError::catalog(&self.dir, e.to_string()))?;

        let mut migrations = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MigrateError::catalog(&self.dir, e.to_string()))?;
            let file_type = entry
                .file_type()
                .map_err(|e| MigrateError::catalog(&self.dir, e.to_string()))?;
            if file_type.is_dir() {
                continue;
            }

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                debug!("Skipping non UTF-8 file name {:?}", entry.path());
                continue;
            };
            if name.ends_with(".sql") {
                migrations.push(Migration::new(name));
            }
        }

        migrations.sort();
        debug!(
            "Found {} migrations in {}",
            migrations.len(),
            self.dir.display()
        );
        Ok(migrations)
    }
}

/// Fixed, in-memory migration list. Order is kept exactly as given.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    ids: Vec<String>,
}

impl StaticCatalog {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl MigrationSource for StaticCatalog {
    fn find_migrations(&self) -> Result<Vec<Migration>> {
        Ok(self.ids.iter().cloned().map(Migration::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ids(migrations: &[Migration]) -> Vec<&str> {
        migrations.iter().map(|m| m.id.as_str()).collect()
    }

    fn dir_with(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            std::fs::write(dir.path().join(file), "-- +migrate Up\n").unwrap();
        }
        dir
    }

    #[test]
    fn test_version_parsing() {
        assert_eq!(Migration::new("20230101_init.sql").version(), Some(20230101));
        assert_eq!(Migration::new("1-init.sql").version(), Some(1));
        assert_eq!(Migration::new("init.sql").version(), None);
    }

    #[test]
    fn test_numeric_order_beats_lexical() {
        let dir = dir_with(&["10_add_index.sql", "2_add_users.sql", "1_init.sql"]);
        let migrations = FileCatalog::new(dir.path()).find_migrations().unwrap();
        assert_eq!(
            ids(&migrations),
            vec!["1_init.sql", "2_add_users.sql", "10_add_index.sql"]
        );
    }

    #[test]
    fn test_numbered_before_unnumbered() {
        let dir = dir_with(&["seed.sql", "2_b.sql", "alpha.sql", "1_a.sql"]);
        let migrations = FileCatalog::new(dir.path()).find_migrations().unwrap();
        assert_eq!(ids(&migrations), vec!["1_a.sql", "2_b.sql", "alpha.sql", "seed.sql"]);
    }

    #[test]
    fn test_same_version_falls_back_to_id() {
        let dir = dir_with(&["1_b.sql", "1_a.sql"]);
        let migrations = FileCatalog::new(dir.path()).find_migrations().unwrap();
        assert_eq!(ids(&migrations), vec!["1_a.sql", "1_b.sql"]);
    }

    #[test]
    fn test_version_beyond_u64_stays_numbered() {
        let huge = "123456789012345678901234567890_huge.sql";
        assert_eq!(Migration::new(huge).version(), None);
        assert_eq!(
            Migration::new(huge).version_digits(),
            Some("123456789012345678901234567890")
        );

        let dir = dir_with(&["zeta.sql", huge, "99999999999999999999_big.sql", "2_small.sql"]);
        let migrations = FileCatalog::new(dir.path()).find_migrations().unwrap();
        assert_eq!(
            ids(&migrations),
            vec!["2_small.sql", "99999999999999999999_big.sql", huge, "zeta.sql"]
        );
    }

    #[test]
    fn test_leading_zeros_compare_by_value() {
        let mut migrations = vec![Migration::new("010_c.sql"), Migration::new("9_b.sql")];
        migrations.sort();
        assert_eq!(ids(&migrations), vec!["9_b.sql", "010_c.sql"]);
    }

    #[test]
    fn test_ignores_non_sql_files_and_directories() {
        let dir = dir_with(&["1_init.sql", "README.md", "2_users.sql.bak"]);
        std::fs::create_dir(dir.path().join("3_nested.sql")).unwrap();
        let migrations = FileCatalog::new(dir.path()).find_migrations().unwrap();
        assert_eq!(ids(&migrations), vec!["1_init.sql"]);
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        let migrations = FileCatalog::new(dir.path()).find_migrations().unwrap();
        assert!(migrations.is_empty());
    }

    #[test]
    fn test_missing_directory_is_catalog_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = FileCatalog::new(&missing).find_migrations().unwrap_err();
        assert!(matches!(err, MigrateError::Catalog { .. }));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_static_catalog_keeps_order() {
        let catalog = StaticCatalog::new(["b", "a", "c"]);
        let migrations = catalog.find_migrations().unwrap();
        assert_eq!(ids(&migrations), vec!["b", "a", "c"]);
    }
}
