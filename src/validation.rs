use anyhow::{anyhow, Result};
use std::path::Path;

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a source file path given on the command line or in config
    pub fn validate_source_path(path: &Path) -> Result<()> {
        let path_str = path.to_string_lossy();
        if path_str.trim().is_empty() {
            return Err(anyhow!("Source path cannot be empty"));
        }

        if path_str.contains('\0') {
            return Err(anyhow!("Source path contains invalid characters"));
        }

        // Check path length
        if path_str.len() > 4096 {
            return Err(anyhow!("Source path too long (max 4096 characters)"));
        }

        if path.is_dir() {
            return Err(anyhow!("Source path is a directory: {path:?}"));
        }

        Ok(())
    }

    /// Validate the directory merged messages are written to
    pub fn validate_output_dir(path: &Path) -> Result<()> {
        let path_str = path.to_string_lossy();
        if path_str.trim().is_empty() {
            return Err(anyhow!("Output directory cannot be empty"));
        }

        if path_str.len() > 4096 {
            return Err(anyhow!("Output directory path too long (max 4096 characters)"));
        }

        if path.exists() && !path.is_dir() {
            return Err(anyhow!("Output path exists and is not a directory: {path:?}"));
        }

        Ok(())
    }

    /// Validate the number of resolution workers
    pub fn validate_worker_count(workers: usize) -> Result<()> {
        if workers == 0 {
            return Err(anyhow!("Worker count must be greater than 0"));
        }

        if workers > 256 {
            return Err(anyhow!("Worker count too large (max 256)"));
        }

        Ok(())
    }

    /// Validate chunk size
    pub fn validate_chunk_size(size: f64) -> Result<()> {
        if size <= 0.0 || size.is_nan() {
            return Err(anyhow!("Chunk size must be positive"));
        }

        if size > 1000.0 {
            return Err(anyhow!("Chunk size too large (max 1000 MB)"));
        }

        Ok(())
    }

    /// Validate lines per chunk
    pub fn validate_lines_per_chunk(lines: usize) -> Result<()> {
        if lines == 0 {
            return Err(anyhow!("Lines per chunk must be greater than 0"));
        }

        if lines > 1_000_000 {
            return Err(anyhow!("Lines per chunk too large (max 1,000,000)"));
        }

        Ok(())
    }

    /// Sanitize text for single-line output.
    ///
    /// Control characters are dropped and line breaks become spaces.
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter_map(|c| match c {
                '\n' | '\r' | '\t' => Some(' '),
                c if c.is_control() => None,
                c => Some(c),
            })
            .collect::<String>()
            .trim()
            .to_string()
    }
}
