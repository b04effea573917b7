//! File writing utilities for merged message export.
//!
//! This module writes merged messages to files in various formats (TXT, CSV,
//! JSON). It is the hand-off point to downstream statistics and reporting
//! tools, which read these files rather than the source stores.

use crate::config::ExportConfig;
use crate::error::Result;
use crate::models::{MergedMessage, OutputFormat};
use crate::utils::{chunk_by_limits, chunk_by_lines, chunk_by_size};
use crate::validation::InputValidator;
use csv::Writer;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How to split the export into files
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Chunking {
    /// Everything in one file
    Single,
    /// At most this many messages per file
    Lines(usize),
    /// Roughly this many megabytes per file
    SizeMb(f64),
    /// Start a new file when either limit would be exceeded
    Limits { lines: usize, size_mb: f64 },
}

impl Chunking {
    /// Chunking used when no limit is given on the command line
    #[must_use]
    pub fn from_config(export: &ExportConfig) -> Self {
        Self::Limits {
            lines: export.max_lines_per_chunk,
            size_mb: export.max_chunk_size_mb,
        }
    }
}

/// Write merged messages into `output_dir`, one file per chunk.
///
/// Files are named `merged_messages.<ext>` or, when chunked,
/// `merged_messages_chunk_<n>.<ext>`.
///
/// # Returns
///
/// Paths of the created files, in chunk order
pub fn export_messages(
    messages: &[MergedMessage],
    format: OutputFormat,
    output_dir: &Path,
    chunking: Chunking,
) -> Result<Vec<PathBuf>> {
    if messages.is_empty() {
        return Ok(Vec::new());
    }

    create_dir_all(output_dir)?;

    let chunks = match chunking {
        Chunking::Single => vec![messages],
        Chunking::Lines(lines) => chunk_by_lines(messages, lines),
        Chunking::SizeMb(size_mb) => chunk_by_size(messages, size_mb),
        Chunking::Limits { lines, size_mb } => chunk_by_limits(messages, lines, size_mb),
    };

    let mut output_files = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        let file_name = if chunks.len() > 1 {
            format!("merged_messages_chunk_{}.{}", i + 1, format.extension())
        } else {
            format!("merged_messages.{}", format.extension())
        };
        let file_path = output_dir.join(file_name);
        write_messages_to_file(chunk, format, &file_path)?;
        output_files.push(file_path);
    }

    Ok(output_files)
}

/// Write messages to a file in the specified format.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn write_messages_to_file(messages: &[MergedMessage], format: OutputFormat, file_path: &Path) -> Result<()> {
    match format {
        OutputFormat::Txt => write_txt_file(messages, file_path),
        OutputFormat::Csv => write_csv_file(messages, file_path),
        OutputFormat::Json => write_json_file(messages, file_path),
    }
}

fn direction(message: &MergedMessage) -> &'static str {
    if message.record.is_outgoing {
        "out"
    } else {
        "in"
    }
}

/// Write messages to a text file.
///
/// Format: `contact, timestamp, direction, text` (one message per line)
fn write_txt_file(messages: &[MergedMessage], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = BufWriter::new(file);

    for message in messages {
        // Names from the address book may carry unescaped line breaks
        let name = InputValidator::sanitize_text(&message.resolved_contact_name);
        let text = message.record.text.as_deref().map(InputValidator::sanitize_text);
        let body = match (text, message.record.media_mime_type.as_deref()) {
            (Some(text), _) if !text.is_empty() => text,
            (_, Some(mime)) => format!("<{mime}>"),
            _ => String::new(),
        };
        writeln!(
            writer,
            "{}, {}, {}, {}",
            name,
            message.record.timestamp.format(TIMESTAMP_FORMAT),
            direction(message),
            body
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// Write messages to a CSV file.
///
/// Includes header row: `ID, Contact, Datetime, Outgoing, Type, Mime, Message`
fn write_csv_file(messages: &[MergedMessage], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = Writer::from_writer(BufWriter::new(file));

    writer.write_record(["ID", "Contact", "Datetime", "Outgoing", "Type", "Mime", "Message"])?;

    for message in messages {
        let id = message.record.message_id.to_string();
        let datetime = message.record.timestamp.format(TIMESTAMP_FORMAT).to_string();
        let message_type = message.record.message_type.to_string();
        writer.write_record([
            id.as_str(),
            message.resolved_contact_name.as_str(),
            datetime.as_str(),
            if message.record.is_outgoing { "1" } else { "0" },
            message_type.as_str(),
            message.record.media_mime_type.as_deref().unwrap_or(""),
            message.record.text.as_deref().unwrap_or(""),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write messages to a JSON file.
///
/// Outputs a JSON array of merged message objects.
fn write_json_file(messages: &[MergedMessage], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, messages)?;
    Ok(())
}
