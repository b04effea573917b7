//! Loads the secondary contact store into a directory keyed by raw identity.

use std::path::Path;

use rusqlite::Row;
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::db::{scan_rows, text_column, SourceDb};
use crate::error::Result;
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::{ContactDirectory, DirectoryEntry};
use crate::schema::wa_contacts;

const SOURCE: &str = "contact_directory";

fn map_entry(row: &Row<'_>) -> rusqlite::Result<Option<DirectoryEntry>> {
    let Some(raw_identity) = text_column(row, 0)? else {
        return Ok(None);
    };
    Ok(Some(DirectoryEntry {
        raw_identity,
        display_name: text_column(row, 1)?,
        alt_name: text_column(row, 2)?,
    }))
}

/// Read the contact table, failing on query errors.
///
/// When an identity has several rows, the first one read is kept.
pub fn try_load_directory(db: &SourceDb) -> Result<ContactDirectory> {
    let conn = db.get_connection()?;
    let sql = format!(
        "SELECT {}, {}, {} FROM {}",
        wa_contacts::JID,
        wa_contacts::DISPLAY_NAME,
        wa_contacts::WA_NAME,
        wa_contacts::TABLE
    );
    let scan = scan_rows(&conn, &sql, SOURCE, map_entry)?;
    MetricsCollector::default().record_skipped_records(SOURCE, scan.skipped);

    let mut directory = ContactDirectory::new();
    for entry in scan.rows.into_iter().flatten() {
        directory.entry(entry.raw_identity.clone()).or_insert(entry);
    }
    Ok(directory)
}

/// Load raw identity → directory entry from the contact store at `path`.
///
/// A missing path or file, or a failing query, yields an empty directory.
#[must_use]
pub fn load_directory(path: Option<&Path>, settings: &DatabaseConfig) -> ContactDirectory {
    let _timer = OperationTimer::new("load_directory");
    let Some(db) = SourceDb::open_optional(path, settings, SOURCE) else {
        warn!("WA DB connection not established");
        return ContactDirectory::new();
    };

    match try_load_directory(&db) {
        Ok(directory) => {
            MetricsCollector::default().record_source_rows(SOURCE, directory.len());
            info!(count = directory.len(), "Contact directory loaded");
            directory
        },
        Err(e) => {
            warn!(path = %db.path().display(), error = %e, "Error parsing contact directory");
            MetricsCollector::default().record_source_failure(SOURCE);
            ContactDirectory::new()
        },
    }
}
