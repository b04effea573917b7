use std::path::{Path, PathBuf};
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row};
use tracing::{debug, warn};

use crate::config::DatabaseConfig;
use crate::error::{ChatMergeError, Result};

// Type alias for the database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Read-only handle on one of the SQLite source stores
#[derive(Clone)]
pub struct SourceDb {
    pool: DbPool,
    path: PathBuf,
}

impl SourceDb {
    /// Open a read-only connection pool on an existing database file
    pub fn open(path: &Path, settings: &DatabaseConfig) -> Result<Self> {
        if path.as_os_str().is_empty() || !path.is_file() {
            return Err(ChatMergeError::SourceUnavailable(path.to_path_buf()));
        }
        if settings.max_connections == 0 || settings.connection_timeout_secs == 0 {
            return Err(ChatMergeError::InvalidConfig(
                "pool size and connection timeout must be greater than 0".to_string(),
            ));
        }

        // Sources are never written, and never created if missing
        let manager = SqliteConnectionManager::file(path)
            .with_flags(OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX);
        let pool = Pool::builder()
            .max_size(settings.max_connections)
            .connection_timeout(Duration::from_secs(settings.connection_timeout_secs))
            .build(manager)?;

        debug!(path = %path.display(), "Opened source database");
        Ok(Self {
            pool,
            path: path.to_path_buf(),
        })
    }

    /// Open a source that is allowed to be missing.
    ///
    /// Returns `None` (and logs why) when no path is given or the file
    /// cannot be opened.
    pub fn open_optional(path: Option<&Path>, settings: &DatabaseConfig, source: &str) -> Option<Self> {
        let Some(path) = path else {
            warn!(source, "No path configured, source skipped");
            return None;
        };

        match Self::open(path, settings) {
            Ok(db) => Some(db),
            Err(e) => {
                warn!(source, path = %path.display(), error = %e, "Source unavailable, treating as empty");
                None
            },
        }
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Path of the database file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Rows decoded from a query, plus how many rows had to be skipped
#[derive(Debug)]
pub struct RowScan<T> {
    /// Successfully decoded rows, in query order
    pub rows: Vec<T>,
    /// Rows that failed to decode
    pub skipped: usize,
}

/// Run `sql` and decode every row with `decode`.
///
/// A row that fails to decode is logged and skipped. A failure to prepare or
/// step the statement is returned to the caller.
pub fn scan_rows<T>(
    conn: &Connection, sql: &str, source: &str, mut decode: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<RowScan<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;

    let mut decoded = Vec::new();
    let mut skipped = 0;
    while let Some(row) = rows.next()? {
        match decode(row) {
            Ok(value) => decoded.push(value),
            Err(e) => {
                skipped += 1;
                warn!(source, error = %e, "Skipping undecodable row");
            },
        }
    }

    Ok(RowScan { rows: decoded, skipped })
}

/// Read a text column, dropping any bytes that are not valid UTF-8.
///
/// NULL and non-text values read as `None`.
pub fn text_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    match row.get_ref(idx)? {
        ValueRef::Text(bytes) => Ok(Some(decode_dropping_invalid(bytes))),
        ValueRef::Null | ValueRef::Integer(_) | ValueRef::Real(_) | ValueRef::Blob(_) => Ok(None),
    }
}

fn decode_dropping_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn settings() -> DatabaseConfig {
        DatabaseConfig {
            max_connections: 2,
            connection_timeout_secs: 1,
        }
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempdir().expect("Failed to create temp directory");
        let result = SourceDb::open(&dir.path().join("missing.db"), &settings());
        assert!(matches!(result, Err(ChatMergeError::SourceUnavailable(_))));
        assert!(!dir.path().join("missing.db").exists());
    }

    #[test]
    fn test_open_rejects_empty_pool() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("empty.db");
        Connection::open(&path).expect("Failed to create database");

        let settings = DatabaseConfig {
            max_connections: 0,
            connection_timeout_secs: 1,
        };
        let result = SourceDb::open(&path, &settings);
        assert!(matches!(result, Err(ChatMergeError::InvalidConfig(_))));
    }

    #[test]
    fn test_open_optional_without_path() {
        assert!(SourceDb::open_optional(None, &settings(), "test").is_none());
    }

    #[test]
    fn test_scan_rows_skips_bad_rows() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("rows.db");
        let conn = Connection::open(&path).expect("Failed to create database");
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER, name TEXT);
             INSERT INTO t VALUES (1, 'a'), (NULL, 'b'), (3, X'ff61');",
        )
        .expect("Failed to populate database");

        let db = SourceDb::open(&path, &settings()).expect("Failed to open database");
        let conn = db.get_connection().expect("Failed to get connection");
        let scan = scan_rows(&conn, "SELECT id, name FROM t", "test", |row| {
            Ok((row.get::<_, i64>(0)?, text_column(row, 1)?))
        })
        .expect("Query failed");

        assert_eq!(scan.skipped, 1);
        assert_eq!(scan.rows.len(), 2);
        assert_eq!(scan.rows[0], (1, Some("a".to_string())));
        // Blob values are not text
        assert_eq!(scan.rows[1], (3, None));
    }

    #[test]
    fn test_text_column_drops_invalid_bytes() {
        let conn = Connection::open_in_memory().expect("Failed to open database");
        let value = conn
            .query_row("SELECT CAST(X'61ff62' AS TEXT)", [], |row| text_column(row, 0))
            .expect("Query failed");
        assert_eq!(value, Some("ab".to_string()));
    }
}
