//! Merge of declared migrations with applied records.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{MigrateError, Result};
use crate::records::AppliedRecord;

/// Status of one declared migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub id: String,
    pub applied: bool,
    /// Set only when `applied` is true.
    pub applied_at: Option<DateTime<Utc>>,
}

impl StatusEntry {
    fn pending(id: &str) -> Self {
        Self {
            id: id.to_string(),
            applied: false,
            applied_at: None,
        }
    }
}

/// Result of reconciling a catalog against applied records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// One entry per catalog migration, in catalog order.
    pub entries: Vec<StatusEntry>,

    /// Record identifiers with no catalog migration, once per record, in
    /// record order.
    pub orphans: Vec<String>,

    /// Catalog identifiers that had more than one applied record. The last
    /// record seen determines `applied_at`.
    pub duplicate_records: Vec<String>,
}

impl Reconciliation {
    /// Number of applied migrations.
    pub fn applied_count(&self) -> usize {
        self.entries.iter().filter(|e| e.applied).count()
    }

    /// Number of migrations not yet applied.
    pub fn pending_count(&self) -> usize {
        self.entries.len() - self.applied_count()
    }
}

/// Reconcile the catalog (authoritative order) with applied records (any order).
///
/// Returns [`MigrateError::DuplicateIdentifier`] if the catalog names the
/// same migration twice. Records never make this fail.
pub fn reconcile<S: AsRef<str>>(
    catalog: &[S],
    records: &[AppliedRecord],
) -> Result<Reconciliation> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(catalog.len());
    let mut entries = Vec::with_capacity(catalog.len());
    for id in catalog {
        let id = id.as_ref();
        if index.insert(id, entries.len()).is_some() {
            return Err(MigrateError::DuplicateIdentifier(id.to_string()));
        }
        entries.push(StatusEntry::pending(id));
    }

    let mut orphans = Vec::new();
    let mut duplicate_records = Vec::new();
    let mut reported: HashSet<usize> = HashSet::new();
    for record in records {
        match index.get(record.id.as_str()) {
            Some(&pos) => {
                let entry = &mut entries[pos];
                if entry.applied && reported.insert(pos) {
                    duplicate_records.push(entry.id.clone());
                }
                entry.applied = true;
                entry.applied_at = Some(record.applied_at);
            }
            None => orphans.push(record.id.clone()),
        }
    }

    // `entries` was built by walking the catalog, so its order is the catalog's
    Ok(Reconciliation {
        entries,
        orphans,
        duplicate_records,
    })
}
