use std::path::PathBuf;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::models::OutputFormat;

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub sources: SourceConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub merge: MergeConfig,
    pub export: ExportConfig,
}

/// Locations of the three sources. An empty string means "not provided".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub msgstore_path: String,
    pub contacts_db_path: String,
    pub address_book_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Worker threads used for per-message resolution
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub default_format: String,
    pub max_chunk_size_mb: f64,
    pub max_lines_per_chunk: usize,
    pub output_directory: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sources: SourceConfig {
                msgstore_path: "msgstore.db".to_string(),
                contacts_db_path: "wa.db".to_string(),
                address_book_path: "contacts.vcf".to_string(),
            },
            database: DatabaseConfig {
                max_connections: 2,
                connection_timeout_secs: 5,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            merge: MergeConfig { workers: 4 },
            export: ExportConfig {
                default_format: "csv".to_string(),
                max_chunk_size_mb: 10.0,
                max_lines_per_chunk: 100_000,
                output_directory: "./wa_merge_output".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            // Start with default values
            .add_source(Config::try_from(&Self::default())?)
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("config").required(false))
            // Add environment variables with prefix, e.g. WA_MERGE__MERGE__WORKERS=8
            .add_source(
                Environment::with_prefix("WA_MERGE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate database config
        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("max_connections must be greater than 0"));
        }
        if self.database.connection_timeout_secs == 0 {
            return Err(anyhow::anyhow!("connection_timeout_secs must be greater than 0"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        crate::validation::InputValidator::validate_worker_count(self.merge.workers)?;

        // Validate export config
        if OutputFormat::from_name(&self.export.default_format).is_none() {
            return Err(anyhow::anyhow!(
                "Invalid export format: {}. Must be one of: [\"txt\", \"csv\", \"json\"]",
                self.export.default_format
            ));
        }

        if self.export.max_chunk_size_mb <= 0.0 {
            return Err(anyhow::anyhow!("max_chunk_size_mb must be greater than 0"));
        }

        if self.export.max_lines_per_chunk == 0 {
            return Err(anyhow::anyhow!("max_lines_per_chunk must be greater than 0"));
        }

        Ok(())
    }

    /// Message store path, if one is configured
    #[must_use]
    pub fn msgstore_path(&self) -> Option<PathBuf> {
        non_empty_path(&self.sources.msgstore_path)
    }

    /// Contact store path, if one is configured
    #[must_use]
    pub fn contacts_db_path(&self) -> Option<PathBuf> {
        non_empty_path(&self.sources.contacts_db_path)
    }

    /// Address book path, if one is configured
    #[must_use]
    pub fn address_book_path(&self) -> Option<PathBuf> {
        non_empty_path(&self.sources.address_book_path)
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}

fn non_empty_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}
