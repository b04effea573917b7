//! Error types for the wa-history-merge library.
//!
//! Loaders swallow most of these at the smallest scope they can and log them;
//! the variants still exist so that the swallowed failure stays visible to
//! tests and to callers that want the strict variants of the loaders.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading sources or exporting merged messages.
#[derive(Error, Debug)]
pub enum ChatMergeError {
    /// SQLite errors from either store
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool could not hand out a connection
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// A source path was not given or does not exist
    #[error("Source unavailable: {0}")]
    SourceUnavailable(PathBuf),

    /// A single address-book record could not be parsed
    #[error("Malformed record #{index}: {reason}")]
    MalformedRecord {
        /// Zero-based position of the record in the file
        index: usize,
        /// What was wrong with it
        reason: String,
    },

    /// The primary store produced no messages at all
    #[error("No messages could be read from the message store")]
    NoData,

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV export errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience type alias for Result with `ChatMergeError`
pub type Result<T> = std::result::Result<T, ChatMergeError>;
