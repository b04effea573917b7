//! Builds the identity index from the message store's identity table.

use rusqlite::Row;
use tracing::{info, warn};

use crate::db::{scan_rows, text_column, SourceDb};
use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::models::{IdentityIndex, IdentityRecord, DOMAIN_SEPARATOR};
use crate::schema::jid;

const SOURCE: &str = "identity";

/// The substring of an identity before its domain separator, or the whole
/// identity if it has none
#[must_use]
pub fn local_part_of(raw_identity: &str) -> &str {
    raw_identity
        .split_once(DOMAIN_SEPARATOR)
        .map_or(raw_identity, |(local, _)| local)
}

fn map_identity(row: &Row<'_>) -> rusqlite::Result<IdentityRecord> {
    Ok(IdentityRecord {
        identity_id: row.get(0)?,
        raw_identity: text_column(row, 1)?,
        local_part: text_column(row, 2)?,
    })
}

/// Read the identity table, failing on query errors
pub fn try_build_identity_index(db: &SourceDb) -> Result<IdentityIndex> {
    let conn = db.get_connection()?;
    let sql = format!(
        "SELECT {}, {}, {} FROM {}",
        jid::ID,
        jid::RAW_STRING,
        jid::USER,
        jid::TABLE
    );
    let scan = scan_rows(&conn, &sql, SOURCE, map_identity)?;
    MetricsCollector::default().record_skipped_records(SOURCE, scan.skipped);

    Ok(scan
        .rows
        .into_iter()
        .map(|record| (record.identity_id, record))
        .collect())
}

/// Build identity row id → identity record.
///
/// An absent store or a failing query yields an empty index.
#[must_use]
pub fn build_identity_index(db: Option<&SourceDb>) -> IdentityIndex {
    let Some(db) = db else {
        return IdentityIndex::new();
    };

    match try_build_identity_index(db) {
        Ok(index) => {
            MetricsCollector::default().record_source_rows(SOURCE, index.len());
            info!(count = index.len(), "Identities read");
            index
        },
        Err(e) => {
            warn!(path = %db.path().display(), error = %e, "Error parsing identities");
            MetricsCollector::default().record_source_failure(SOURCE);
            IdentityIndex::new()
        },
    }
}
