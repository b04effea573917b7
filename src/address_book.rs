//! Address book loading.
//!
//! Parses a vCard export into [`AddressBookEntry`] records and builds the
//! digit index used by resolution. Each phone number registers its full digit
//! string and, when it is longer than nine digits, its last nine digits, so a
//! number stored with a calling code in one source still matches the same
//! number stored without one in another.
//!
//! The index is built in a single sequential pass. When two records share a
//! key, the one that appears later in the file wins.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::ChatMergeError;
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::AddressBookEntry;

/// Digit strings this long or shorter are never registered
pub const MIN_KEY_DIGITS: usize = 5;

/// Length of the country-code-agnostic suffix key
pub const SUFFIX_DIGITS: usize = 9;

// group.NAME;PARAMS:VALUE
static CONTENT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^(?:[A-Za-z0-9-]+\.)?([A-Za-z0-9-]+)((?:;[^:]*)?):(.*)$").expect("content line pattern is valid")
});

/// Keep only the ASCII digits of a phone value
#[must_use]
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// The last [`SUFFIX_DIGITS`] characters of `value`, if it is longer than that
#[must_use]
pub fn suffix_key(value: &str) -> Option<&str> {
    let count = value.chars().count();
    if count <= SUFFIX_DIGITS {
        return None;
    }
    value
        .char_indices()
        .nth(count - SUFFIX_DIGITS)
        .map(|(start, _)| &value[start..])
}

/// Index keys contributed by one raw phone value
#[must_use]
pub fn phone_keys(raw: &str) -> Vec<String> {
    let digits = normalize_phone(raw);
    if digits.len() <= MIN_KEY_DIGITS {
        return Vec::new();
    }

    let suffix = suffix_key(&digits).map(str::to_string);
    let mut keys = vec![digits];
    keys.extend(suffix);
    keys
}

/// Digit string → contact name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressBookIndex {
    names: HashMap<String, String>,
}

impl AddressBookIndex {
    /// Build the index from entries in file order, later entries overwriting
    /// earlier ones on shared keys
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a AddressBookEntry>) -> Self {
        let mut names = HashMap::new();
        for entry in entries {
            for key in &entry.digit_keys {
                if let Some(previous) = names.insert(key.clone(), entry.name.clone()) {
                    if previous != entry.name {
                        debug!(key = %key, previous = %previous, name = %entry.name, "Address book key overwritten");
                    }
                }
            }
        }
        Self { names }
    }

    /// Look up a digit string verbatim
    #[must_use]
    pub fn get(&self, digits: &str) -> Option<&str> {
        self.names.get(digits).map(String::as_str)
    }

    /// Number of registered keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if no key is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Result of loading an address book
#[derive(Debug, Default)]
pub struct AddressBookLoad {
    /// Parsed contacts in file order
    pub entries: Vec<AddressBookEntry>,
    /// Records that were skipped, as [`ChatMergeError::MalformedRecord`]
    pub skipped: Vec<ChatMergeError>,
    /// Lookup index built from `entries`
    pub index: AddressBookIndex,
}

/// Load and index an address book.
///
/// A missing path or unreadable file yields an empty result. Malformed
/// records are skipped one by one and reported in [`AddressBookLoad::skipped`].
pub fn load_address_book(path: Option<&Path>) -> AddressBookLoad {
    let _timer = OperationTimer::new("load_address_book");
    let metrics = MetricsCollector::default();

    let Some(path) = path else {
        warn!("No address book configured");
        return AddressBookLoad::default();
    };
    if !path.is_file() {
        warn!(path = %path.display(), "Address book not found, continuing without it");
        return AddressBookLoad::default();
    }

    let text = match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read address book");
            metrics.record_source_failure("address_book");
            return AddressBookLoad::default();
        },
    };

    let load = build_address_book(&text);
    metrics.record_source_rows("address_book", load.entries.len());
    metrics.record_skipped_records("address_book", load.skipped.len());
    info!(
        contacts = load.entries.len(),
        keys = load.index.len(),
        skipped = load.skipped.len(),
        "Address book loaded"
    );
    load
}

/// Parse vCard text and build the index
#[must_use]
pub fn build_address_book(text: &str) -> AddressBookLoad {
    let mut entries = Vec::new();
    let mut skipped = Vec::new();

    for record in parse_vcards(text) {
        match record {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                warn!(error = %e, "Skipping address book record");
                skipped.push(e);
            },
        }
    }

    let index = AddressBookIndex::from_entries(&entries);
    AddressBookLoad { entries, skipped, index }
}

/// Parse every `BEGIN:VCARD` … `END:VCARD` record, one result per record
#[must_use]
pub fn parse_vcards(text: &str) -> Vec<Result<AddressBookEntry, ChatMergeError>> {
    let mut results = Vec::new();
    let mut current: Option<(usize, Vec<String>)> = None;
    let mut next_index = 0;

    for line in unfold_lines(text) {
        let upper = line.trim().to_ascii_uppercase();
        if upper == "BEGIN:VCARD" {
            if let Some((index, _)) = current.take() {
                results.push(Err(malformed(index, "record not terminated before next BEGIN:VCARD")));
            }
            current = Some((next_index, Vec::new()));
            next_index += 1;
        } else if upper == "END:VCARD" {
            match current.take() {
                Some((index, lines)) => results.push(parse_record(index, &lines)),
                None => debug!("END:VCARD outside of a record ignored"),
            }
        } else if let Some((_, lines)) = current.as_mut() {
            if !line.trim().is_empty() {
                lines.push(line);
            }
        }
    }

    if let Some((index, _)) = current {
        results.push(Err(malformed(index, "record not terminated")));
    }

    results
}

fn malformed(index: usize, reason: &str) -> ChatMergeError {
    ChatMergeError::MalformedRecord {
        index,
        reason: reason.to_string(),
    }
}

/// Join folded lines and quoted-printable soft line breaks
fn unfold_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut soft_break = false;

    for raw in text.lines() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if soft_break {
            if let Some(last) = lines.last_mut() {
                last.pop();
                last.push_str(raw);
                soft_break = ends_with_soft_break(last);
                continue;
            }
        }

        match (raw.strip_prefix([' ', '\t']), lines.last_mut()) {
            (Some(rest), Some(last)) => last.push_str(rest),
            _ => lines.push(raw.to_string()),
        }

        soft_break = lines.last().is_some_and(|last| ends_with_soft_break(last));
    }

    lines
}

fn ends_with_soft_break(line: &str) -> bool {
    line.ends_with('=')
        && line
            .split_once(':')
            .is_some_and(|(head, _)| head.to_ascii_uppercase().contains("QUOTED-PRINTABLE"))
}

fn parse_record(index: usize, lines: &[String]) -> Result<AddressBookEntry, ChatMergeError> {
    let mut name: Option<String> = None;
    let mut digit_keys = BTreeSet::new();

    for line in lines {
        let captures = CONTENT_LINE
            .captures(line)
            .ok_or_else(|| malformed(index, &format!("invalid property line: {line}")))?;
        let property = captures[1].to_ascii_uppercase();
        let params = captures[2].to_ascii_uppercase();
        let raw_value = &captures[3];

        let value = if params.contains("QUOTED-PRINTABLE") {
            decode_quoted_printable(raw_value)
        } else {
            raw_value.to_string()
        };

        match property.as_str() {
            "FN" if name.is_none() => name = Some(unescape_text(&value).trim().to_string()),
            "TEL" => digit_keys.extend(phone_keys(&value)),
            _ => {},
        }
    }

    match name {
        Some(name) if !name.is_empty() => Ok(AddressBookEntry { name, digit_keys }),
        Some(_) => Err(malformed(index, "empty FN property")),
        None => Err(malformed(index, "missing FN property")),
    }
}

fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn decode_quoted_printable(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'=' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|hex| u8::from_str_radix(hex, 16).ok()) {
                decoded.push(byte);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}
