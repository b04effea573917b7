//! Joins messages to identities and resolves a contact name for each one.
//!
//! Resolution applies these rules in order, the first that applies wins:
//!
//! 1. a non-empty chat subject, verbatim;
//! 2. `"Unknown"` when there is no identity string;
//! 3. `"Unknown Group"` for a group identity;
//! 4. the contact directory's display name for the exact identity;
//! 5. the address-book name for the identity's local part;
//! 6. the address-book name for the last nine characters of a longer local part;
//! 7. the identity's stored local part, or the computed one.
//!
//! Every index is read-only here, so messages are resolved in parallel and
//! collected back in input order.

use std::path::PathBuf;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::address_book::{load_address_book, suffix_key, AddressBookIndex, AddressBookLoad};
use crate::config::{AppConfig, DatabaseConfig};
use crate::db::SourceDb;
use crate::directory::load_directory;
use crate::error::{ChatMergeError, Result};
use crate::identity::{build_identity_index, local_part_of};
use crate::logging::OperationTimer;
use crate::message_store::read_messages;
use crate::metrics::MetricsCollector;
use crate::models::{
    ContactDirectory, IdentityIndex, IdentityRecord, MergedMessage, MessageRecord, ResolutionRule, GROUP_SUFFIX,
    UNKNOWN_CONTACT, UNKNOWN_GROUP,
};

/// A resolved name and the rule that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved contact name
    pub name: String,
    /// Rule that produced it
    pub rule: ResolutionRule,
}

impl Resolution {
    fn new(name: impl Into<String>, rule: ResolutionRule) -> Self {
        Self {
            name: name.into(),
            rule,
        }
    }
}

/// Resolve the contact name of one message
#[must_use]
pub fn resolve(
    message: &MessageRecord, identity: Option<&IdentityRecord>, directory: &ContactDirectory,
    address_book: &AddressBookIndex,
) -> String {
    resolve_with_rule(message, identity, directory, address_book).name
}

/// Resolve the contact name of one message, reporting which rule fired
#[must_use]
pub fn resolve_with_rule(
    message: &MessageRecord, identity: Option<&IdentityRecord>, directory: &ContactDirectory,
    address_book: &AddressBookIndex,
) -> Resolution {
    if let Some(subject) = message.chat_subject.as_deref().filter(|s| !s.is_empty()) {
        return Resolution::new(subject, ResolutionRule::Subject);
    }

    let Some(raw) = identity.and_then(|i| i.raw_identity.as_deref()) else {
        return Resolution::new(UNKNOWN_CONTACT, ResolutionRule::MissingIdentity);
    };

    if raw.ends_with(GROUP_SUFFIX) {
        return Resolution::new(UNKNOWN_GROUP, ResolutionRule::UnnamedGroup);
    }

    if let Some(name) = directory.get(raw).and_then(|entry| entry.display_name()) {
        return Resolution::new(name, ResolutionRule::Directory);
    }

    let local = local_part_of(raw);
    if let Some(name) = address_book.get(local) {
        return Resolution::new(name, ResolutionRule::AddressBookExact);
    }

    if let Some(name) = suffix_key(local).and_then(|suffix| address_book.get(suffix)) {
        return Resolution::new(name, ResolutionRule::AddressBookSuffix);
    }

    let stored = identity
        .and_then(|i| i.local_part.as_deref())
        .filter(|user| !user.is_empty());
    // The name is never empty, even for an identity like "@s.whatsapp.net"
    let name = stored
        .or_else(|| Some(local).filter(|local| !local.is_empty()))
        .or_else(|| Some(raw).filter(|raw| !raw.is_empty()))
        .unwrap_or(UNKNOWN_CONTACT);
    Resolution::new(name, ResolutionRule::Fallback)
}

fn merge_one(
    record: &MessageRecord, identities: &IdentityIndex, directory: &ContactDirectory, address_book: &AddressBookIndex,
) -> MergedMessage {
    let identity = record.chat_identity_id.and_then(|id| identities.get(&id));
    let resolution = resolve_with_rule(record, identity, directory, address_book);

    MergedMessage {
        record: record.clone(),
        raw_identity: identity.and_then(|i| i.raw_identity.clone()),
        resolved_contact_name: resolution.name,
        resolved_by: resolution.rule,
    }
}

/// Join and resolve every message, preserving input order.
///
/// Resolution runs on `workers` threads; if the thread pool cannot be built
/// it runs on the calling thread instead.
#[must_use]
pub fn merge_messages(
    messages: &[MessageRecord], identities: &IdentityIndex, directory: &ContactDirectory,
    address_book: &AddressBookIndex, workers: usize,
) -> Vec<MergedMessage> {
    let _timer = OperationTimer::new("merge_messages");
    let started = Instant::now();
    let resolve_one = |record: &MessageRecord| merge_one(record, identities, directory, address_book);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("resolve-{i}"))
        .build();

    let merged: Vec<MergedMessage> = match pool {
        Ok(pool) => pool.install(|| messages.par_iter().map(resolve_one).collect()),
        Err(e) => {
            warn!(error = %e, "Failed to build resolver pool, resolving sequentially");
            messages.iter().map(resolve_one).collect()
        },
    };

    MetricsCollector::default().record_merge(&merged, started.elapsed(), workers);
    merged
}

/// Locations of the three sources; `None` means "not provided"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePaths {
    /// Primary message store
    pub msgstore: Option<PathBuf>,
    /// Secondary contact store
    pub contacts_db: Option<PathBuf>,
    /// vCard address book
    pub address_book: Option<PathBuf>,
}

impl SourcePaths {
    /// Source paths from configuration
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            msgstore: config.msgstore_path(),
            contacts_db: config.contacts_db_path(),
            address_book: config.address_book_path(),
        }
    }
}

/// Everything read from the three sources
#[derive(Debug, Default)]
pub struct LoadedSources {
    /// Messages in store order
    pub messages: Vec<MessageRecord>,
    /// Identity row id → identity
    pub identities: IdentityIndex,
    /// Raw identity → directory entry
    pub directory: ContactDirectory,
    /// Parsed address book and its index
    pub address_book: AddressBookLoad,
}

/// Loads the sources and merges them
#[derive(Debug, Clone)]
pub struct MergePipeline {
    database: DatabaseConfig,
    workers: usize,
}

impl MergePipeline {
    /// Create a pipeline with the given pool settings and worker count
    #[must_use]
    pub const fn new(database: DatabaseConfig, workers: usize) -> Self {
        Self { database, workers }
    }

    /// Create a pipeline from application configuration
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.database.clone(), config.merge.workers)
    }

    /// Load every source. Missing or broken sources load as empty.
    #[must_use]
    pub fn load_sources(&self, paths: &SourcePaths) -> LoadedSources {
        let _timer = OperationTimer::new("load_sources");

        // Messages and identities share one pool on the primary store
        let primary = SourceDb::open_optional(paths.msgstore.as_deref(), &self.database, "message_store");
        let messages = read_messages(primary.as_ref());
        let identities = build_identity_index(primary.as_ref());

        let directory = load_directory(paths.contacts_db.as_deref(), &self.database);
        let address_book = load_address_book(paths.address_book.as_deref());

        LoadedSources {
            messages,
            identities,
            directory,
            address_book,
        }
    }

    /// Merge already-loaded sources.
    ///
    /// Fails with [`ChatMergeError::NoData`] when there are no messages.
    pub fn merge(&self, sources: &LoadedSources) -> Result<Vec<MergedMessage>> {
        if sources.messages.is_empty() {
            return Err(ChatMergeError::NoData);
        }

        let merged = merge_messages(
            &sources.messages,
            &sources.identities,
            &sources.directory,
            &sources.address_book.index,
            self.workers,
        );
        info!(count = merged.len(), "Messages merged");
        Ok(merged)
    }

    /// Load every source and merge
    pub fn run(&self, paths: &SourcePaths) -> Result<Vec<MergedMessage>> {
        let sources = self.load_sources(paths);
        self.merge(&sources)
    }
}
