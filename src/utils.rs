//! Utility functions for splitting merged messages into export chunks.

use crate::models::MergedMessage;

/// Approximate bytes one merged message takes in an export file
#[must_use]
pub fn estimated_size(message: &MergedMessage) -> usize {
    // name + text + mime + timestamp/flags formatting overhead
    message.resolved_contact_name.len()
        + message.record.text.as_deref().map_or(0, str::len)
        + message.record.media_mime_type.as_deref().map_or(0, str::len)
        + 50
}

/// Chunk messages by approximate size in MB.
///
/// # Arguments
///
/// * `messages` - Slice of messages to chunk
/// * `size_mb` - Target size per chunk in megabytes
///
/// # Returns
///
/// Chunks in input order, each approximately `size_mb` MB. A single message
/// larger than the target gets a chunk of its own.
#[must_use]
pub fn chunk_by_size(messages: &[MergedMessage], size_mb: f64) -> Vec<&[MergedMessage]> {
    chunk_by_limits(messages, usize::MAX, size_mb)
}

/// Chunk messages by both line count and approximate size in MB.
///
/// A chunk is closed as soon as adding the next message would exceed
/// `lines_per_chunk` messages or `size_mb` MB, whichever comes first.
#[must_use]
pub fn chunk_by_limits(messages: &[MergedMessage], lines_per_chunk: usize, size_mb: f64) -> Vec<&[MergedMessage]> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let size_bytes = (size_mb * 1024.0 * 1024.0) as usize;
    let lines_per_chunk = lines_per_chunk.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut current_size = 0;

    for (i, message) in messages.iter().enumerate() {
        let message_size = estimated_size(message);

        let too_big = current_size + message_size > size_bytes;
        if (too_big || i - start >= lines_per_chunk) && i > start {
            chunks.push(&messages[start..i]);
            start = i;
            current_size = 0;
        }

        current_size += message_size;
    }

    if start < messages.len() {
        chunks.push(&messages[start..]);
    }

    chunks
}

/// Chunk messages by line count.
///
/// Each chunk holds at most `lines_per_chunk` messages; zero is treated as one.
#[must_use]
pub fn chunk_by_lines(messages: &[MergedMessage], lines_per_chunk: usize) -> Vec<&[MergedMessage]> {
    messages.chunks(lines_per_chunk.max(1)).collect()
}
