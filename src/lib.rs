//! WA History Merge - contact identity resolution for chat histories
//!
//! A Rust library that reads a WhatsApp-style message store, its companion
//! contact store and a vCard address book, and gives every message a
//! human-readable contact name.
//!
//! # Features
//!
//! - Read messages, chats and media types from the message store
//! - Index identities, directory names and address-book phone numbers
//! - Resolve a contact name per message with a fixed precedence policy
//! - Parallel, order-preserving resolution
//! - Export merged messages to TXT, CSV or JSON

/// Address book (vCard) loading and digit index
pub mod address_book;
/// Configuration management
pub mod config;
/// Read-only source database access
pub mod db;
/// Contact directory loading
pub mod directory;
/// Error types
pub mod error;
/// Export of merged messages
pub mod file_writer;
/// Identity index building
pub mod identity;
/// Logging setup and utilities
pub mod logging;
/// Merge pipeline and name resolution
pub mod merge;
/// Message store reading
pub mod message_store;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Source database schema definitions
pub mod schema;
/// Export chunking helpers
pub mod utils;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use address_book::AddressBookIndex;
pub use error::{ChatMergeError, Result};
pub use merge::{resolve, MergePipeline, SourcePaths};
pub use models::{MergedMessage, MessageRecord, OutputFormat};
