//! Data models for message and contact identity records
//!
//! This module contains the typed records read from each source and the merged
//! record handed to downstream consumers. None of them are mutated after they
//! are built.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Domain suffix of a group chat identity
pub const GROUP_SUFFIX: &str = "@g.us";

/// Separator between the local part and the domain of an identity
pub const DOMAIN_SEPARATOR: char = '@';

/// Placeholder used when a message has no identity string at all
pub const UNKNOWN_CONTACT: &str = "Unknown";

/// Placeholder used for group chats that carry no subject
pub const UNKNOWN_GROUP: &str = "Unknown Group";

/// A message read from the primary message store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Message row id
    pub message_id: i64,
    /// Chat row id the message belongs to
    pub chat_id: Option<i64>,
    /// True if the message was sent by the device owner
    pub is_outgoing: bool,
    /// When the message was sent
    pub timestamp: DateTime<Utc>,
    /// Message text, absent for most media messages
    pub text: Option<String>,
    /// Identity row id of the chat
    pub chat_identity_id: Option<i64>,
    /// Chat subject, set for named and group chats
    pub chat_subject: Option<String>,
    /// Store-specific message type code
    pub message_type: i64,
    /// MIME type of the attached media, if any
    pub media_mime_type: Option<String>,
}

/// A row of the message store's identity table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Identity row id
    pub identity_id: i64,
    /// Raw identity string such as `34666123456@s.whatsapp.net`.
    /// `None` when the stored value is not text.
    pub raw_identity: Option<String>,
    /// Local part stored alongside the raw identity
    pub local_part: Option<String>,
}

impl IdentityRecord {
    /// True if the raw identity names a group chat
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.raw_identity
            .as_deref()
            .is_some_and(|raw| raw.ends_with(GROUP_SUFFIX))
    }
}

/// Identity row id → identity record
pub type IdentityIndex = HashMap<i64, IdentityRecord>;

/// A row of the secondary contact store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Raw identity string the entry is keyed by
    pub raw_identity: String,
    /// Name shown for the contact
    pub display_name: Option<String>,
    /// Alternate name published by the contact
    pub alt_name: Option<String>,
}

impl DirectoryEntry {
    /// The display name, if it is present and non-empty.
    ///
    /// Entries without one do not count as a match.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Raw identity → directory entry
pub type ContactDirectory = HashMap<String, DirectoryEntry>;

/// A contact parsed from the address book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBookEntry {
    /// Formatted name of the contact
    pub name: String,
    /// Normalized digit keys contributed by the contact's phone fields
    pub digit_keys: BTreeSet<String>,
}

/// Which precedence rule produced a resolved name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionRule {
    /// The chat subject
    Subject,
    /// No identity string was available
    MissingIdentity,
    /// Group identity without a subject
    UnnamedGroup,
    /// Contact directory display name
    Directory,
    /// Exact digit match in the address book
    AddressBookExact,
    /// Last-nine-digit match in the address book
    AddressBookSuffix,
    /// The identity's own local part
    Fallback,
}

impl ResolutionRule {
    /// All rules in precedence order
    pub const ALL: [Self; 7] = [
        Self::Subject,
        Self::MissingIdentity,
        Self::UnnamedGroup,
        Self::Directory,
        Self::AddressBookExact,
        Self::AddressBookSuffix,
        Self::Fallback,
    ];

    /// Stable label used in logs and metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::MissingIdentity => "missing_identity",
            Self::UnnamedGroup => "unnamed_group",
            Self::Directory => "directory",
            Self::AddressBookExact => "address_book_exact",
            Self::AddressBookSuffix => "address_book_suffix",
            Self::Fallback => "fallback",
        }
    }
}

/// A message with its resolved contact name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedMessage {
    /// The message as read from the store
    #[serde(flatten)]
    pub record: MessageRecord,
    /// Raw identity string of the chat, opaque to consumers
    pub raw_identity: Option<String>,
    /// Contact name, always populated
    pub resolved_contact_name: String,
    /// Rule that produced the name
    pub resolved_by: ResolutionRule,
}

/// Output format for exported messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated values format
    Csv,
    /// Plain text format
    Txt,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Json => "json",
        }
    }

    /// Parse a format name, case-insensitively
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "txt" => Some(Self::Txt),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}
