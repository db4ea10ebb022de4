//! Rendering of status entries as a table or JSON.
//!
//! Renderers print entries in the order given; they never sort or filter.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::SecondsFormat;
use serde::Serialize;

use super::StatusEntry;
use crate::error::{MigrateError, Result};

/// Marker shown for migrations that have not been applied.
pub const NOT_APPLIED: &str = "no";

/// Timestamp layout for the table view (no offset, always UTC).
const TABLE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output format for status reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(MigrateError::Config(format!(
                "Unknown output format: {} (expected table or json)",
                other
            ))),
        }
    }
}

#[derive(Serialize)]
struct JsonRow<'a> {
    migration: &'a str,
    applied: String,
}

/// Render entries in the requested format.
pub fn render(entries: &[StatusEntry], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(entries)),
        OutputFormat::Json => render_json(entries),
    }
}

/// Pretty JSON array of `{"migration": ..., "applied": ...}` objects.
pub fn render_json(entries: &[StatusEntry]) -> Result<String> {
    let rows: Vec<JsonRow<'_>> = entries
        .iter()
        .map(|entry| JsonRow {
            migration: &entry.id,
            applied: match (entry.applied, entry.applied_at) {
                (true, Some(at)) => at.to_rfc3339_opts(SecondsFormat::Secs, true),
                _ => NOT_APPLIED.to_string(),
            },
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

/// Bordered two-column table.
///
/// ```text
/// +---------------+---------------------+
/// |   MIGRATION   |       APPLIED       |
/// +---------------+---------------------+
/// | 1_initial.sql | 2023-01-01 10:00:00 |
/// | 2_record.sql  | no                  |
/// +---------------+---------------------+
/// ```
pub fn render_table(entries: &[StatusEntry]) -> String {
    let rows: Vec<[String; 2]> = entries
        .iter()
        .map(|entry| {
            let applied = match (entry.applied, entry.applied_at) {
                (true, Some(at)) => at.format(TABLE_TIME_FORMAT).to_string(),
                _ => NOT_APPLIED.to_string(),
            };
            [entry.id.clone(), applied]
        })
        .collect();

    let headers = ["MIGRATION", "APPLIED"];
    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border = {
        let mut line = String::from("+");
        for width in widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", border);
    out.push('|');
    for (header, width) in headers.iter().zip(widths) {
        let gap = width - header.chars().count();
        let left = gap / 2;
        let _ = write!(out, " {}{}{} |", " ".repeat(left), header, " ".repeat(gap - left));
    }
    out.push('\n');
    let _ = writeln!(out, "{}", border);

    for row in &rows {
        out.push('|');
        for (cell, width) in row.iter().zip(widths) {
            let pad = width - cell.chars().count();
            let _ = write!(out, " {}{} |", cell, " ".repeat(pad));
        }
        out.push('\n');
    }
    if !rows.is_empty() {
        let _ = writeln!(out, "{}", border);
    }

    out
}
