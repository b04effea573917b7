//! Reads message records from the primary message store.

use chrono::DateTime;
use rusqlite::Row;
use tracing::{info, warn};

use crate::db::{scan_rows, text_column, SourceDb};
use crate::error::Result;
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::MessageRecord;
use crate::schema::{chat, message, message_media};

const SOURCE: &str = "message_store";

fn messages_query() -> String {
    format!(
        "SELECT m.{id}, m.{chat_row}, m.{from_me}, m.{ts}, m.{text}, c.{jid_row}, c.{subject}, m.{msg_type}, mm.{mime}
         FROM {message} m
         LEFT JOIN {chat} c ON m.{chat_row} = c.{chat_id}
         LEFT JOIN {media} mm ON m.{id} = mm.{media_msg}",
        id = message::ID,
        chat_row = message::CHAT_ROW_ID,
        from_me = message::FROM_ME,
        ts = message::TIMESTAMP,
        text = message::TEXT_DATA,
        jid_row = chat::JID_ROW_ID,
        subject = chat::SUBJECT,
        msg_type = message::MESSAGE_TYPE,
        mime = message_media::MIME_TYPE,
        message = message::TABLE,
        chat = chat::TABLE,
        chat_id = chat::ID,
        media = message_media::TABLE,
        media_msg = message_media::MESSAGE_ROW_ID,
    )
}

/// Map a joined message row to a `MessageRecord`
fn map_message(row: &Row<'_>) -> rusqlite::Result<MessageRecord> {
    // A row with a NULL or out-of-range timestamp fails here and is dropped by
    // the scan (counted as skipped) instead of being kept without a time
    let millis: i64 = row.get(3)?;
    let timestamp = DateTime::from_timestamp_millis(millis)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(3, millis))?;

    Ok(MessageRecord {
        message_id: row.get(0)?,
        chat_id: row.get(1)?,
        is_outgoing: row.get::<_, Option<bool>>(2)?.unwrap_or(false),
        timestamp,
        text: text_column(row, 4)?,
        chat_identity_id: row.get(5)?,
        chat_subject: text_column(row, 6)?,
        message_type: row.get::<_, Option<i64>>(7)?.unwrap_or_default(),
        media_mime_type: text_column(row, 8)?,
    })
}

/// Read every message from the store, failing on query errors
pub fn try_read_messages(db: &SourceDb) -> Result<Vec<MessageRecord>> {
    let conn = db.get_connection()?;
    let scan = scan_rows(&conn, &messages_query(), SOURCE, map_message)?;

    let metrics = MetricsCollector::default();
    metrics.record_skipped_records(SOURCE, scan.skipped);
    if scan.skipped > 0 {
        warn!(skipped = scan.skipped, "Some messages could not be decoded");
    }
    Ok(scan.rows)
}

/// Read every message from the store.
///
/// An absent store or a failing query yields an empty sequence.
#[must_use]
pub fn read_messages(db: Option<&SourceDb>) -> Vec<MessageRecord> {
    let _timer = OperationTimer::new("read_messages");
    let Some(db) = db else {
        warn!("Message store connection not established");
        return Vec::new();
    };

    match try_read_messages(db) {
        Ok(messages) => {
            MetricsCollector::default().record_source_rows(SOURCE, messages.len());
            info!(count = messages.len(), "Messages read");
            messages
        },
        Err(e) => {
            warn!(path = %db.path().display(), error = %e, "Error parsing messages");
            MetricsCollector::default().record_source_failure(SOURCE);
            Vec::new()
        },
    }
}
