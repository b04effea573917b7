use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use wa_history_merge::config::AppConfig;
use wa_history_merge::file_writer::{export_messages, Chunking};
use wa_history_merge::logging::{init_logging, OperationTimer};
use wa_history_merge::merge::{MergePipeline, SourcePaths};
use wa_history_merge::metrics::{tally_rules, MetricsCollector};
use wa_history_merge::models::{OutputFormat, ResolutionRule};
use wa_history_merge::validation::InputValidator;
use wa_history_merge::ChatMergeError;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

/// Source locations; anything not given falls back to configuration
#[derive(Args)]
struct SourceArgs {
    /// Path to the message store (msgstore.db)
    #[arg(long)]
    msgstore: Option<PathBuf>,

    /// Path to the contact store (wa.db)
    #[arg(long)]
    wa: Option<PathBuf>,

    /// Path to the vCard address book (contacts.vcf)
    #[arg(long)]
    vcf: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a contact name for every message and export the result
    Merge {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (txt, csv or json)
        #[arg(short, long)]
        format: Option<String>,

        /// Number of messages per output file
        #[arg(short, long)]
        lines: Option<usize>,

        /// Approximate size of each output file in MB
        #[arg(long)]
        size: Option<f64>,

        /// Worker threads used for resolution
        #[arg(short, long)]
        workers: Option<usize>,
    },
    /// Load each source and report what was found, without merging
    Inspect {
        #[command(flatten)]
        sources: SourceArgs,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load()?;

    // Initialize logging; the guard must outlive every log call
    let _log_guard = init_logging(&config.logging, cli.log_level.as_deref())?;

    info!("Starting wa-history-merge");

    match cli.command {
        Commands::Merge {
            sources,
            output,
            format,
            lines,
            size,
            workers,
        } => {
            if let Some(workers) = workers {
                InputValidator::validate_worker_count(workers)?;
                config.merge.workers = workers;
            }
            let paths = resolve_source_paths(&config, sources)?;
            run_merge(&config, &paths, output, format.as_deref(), lines, size)
        },
        Commands::Inspect { sources } => {
            let paths = resolve_source_paths(&config, sources)?;
            inspect_sources(&config, &paths);
            Ok(())
        },
    }
}

/// Command-line paths override configured ones
fn resolve_source_paths(config: &AppConfig, args: SourceArgs) -> Result<SourcePaths> {
    let defaults = SourcePaths::from_config(config);
    let paths = SourcePaths {
        msgstore: args.msgstore.or(defaults.msgstore),
        contacts_db: args.wa.or(defaults.contacts_db),
        address_book: args.vcf.or(defaults.address_book),
    };

    for path in [&paths.msgstore, &paths.contacts_db, &paths.address_book].into_iter().flatten() {
        InputValidator::validate_source_path(path)?;
    }

    info!(msgstore = ?paths.msgstore, wa = ?paths.contacts_db, vcf = ?paths.address_book, "Using sources");
    Ok(paths)
}

/// Run the pipeline and write the merged messages
fn run_merge(
    config: &AppConfig, paths: &SourcePaths, output: Option<PathBuf>, format: Option<&str>, lines: Option<usize>,
    size: Option<f64>,
) -> Result<()> {
    let timer = OperationTimer::new("merge");

    // Parse output format
    let format_name = format.unwrap_or(&config.export.default_format);
    let output_format = OutputFormat::from_name(format_name).unwrap_or_else(|| {
        warn!("Invalid format: {}. Using csv as default.", format_name);
        OutputFormat::Csv
    });

    let chunking = match (lines, size) {
        (Some(lines), _) => {
            InputValidator::validate_lines_per_chunk(lines)?;
            Chunking::Lines(lines)
        },
        (None, Some(size)) => {
            InputValidator::validate_chunk_size(size)?;
            Chunking::SizeMb(size)
        },
        (None, None) => Chunking::from_config(&config.export),
    };

    // Use configuration output directory if not provided
    let output_dir = output.unwrap_or_else(|| PathBuf::from(&config.export.output_directory));
    InputValidator::validate_output_dir(&output_dir)?;

    let pipeline = MergePipeline::from_config(config);
    let merged = match pipeline.run(paths) {
        Ok(merged) => merged,
        Err(ChatMergeError::NoData) => {
            // Returning keeps the log guard alive until it can flush
            error!("No data parsed! Exiting.");
            return Err(ChatMergeError::NoData.into());
        },
        Err(e) => return Err(e).context("Merge failed"),
    };
    info!("Parsed {} messages", merged.len());

    let counts = tally_rules(&merged);
    for rule in ResolutionRule::ALL {
        debug!(rule = rule.as_str(), count = counts.get(&rule).copied().unwrap_or(0), "Resolution rule");
    }

    let files = export_messages(&merged, output_format, &output_dir, chunking)
        .with_context(|| format!("Failed to export to {}", output_dir.display()))?;
    MetricsCollector::default().record_export(output_format.extension(), files.len());
    for file in &files {
        debug!(path = %file.display(), "Wrote export file");
    }

    info!("Done! {} files written to {}", files.len(), output_dir.display());
    timer.finish();
    Ok(())
}

/// Load every source and log what each one contributed
fn inspect_sources(config: &AppConfig, paths: &SourcePaths) {
    let pipeline = MergePipeline::from_config(config);
    let sources = pipeline.load_sources(paths);

    let groups = sources.identities.values().filter(|identity| identity.is_group()).count();
    info!(count = sources.messages.len(), "Message store: messages");
    info!(count = sources.identities.len(), groups, "Message store: identities");
    info!(count = sources.directory.len(), "Contact store: directory entries");
    info!(
        contacts = sources.address_book.entries.len(),
        keys = sources.address_book.index.len(),
        skipped = sources.address_book.skipped.len(),
        "Address book"
    );
    for skipped in &sources.address_book.skipped {
        warn!("{}", skipped);
    }

    if sources.messages.is_empty() {
        warn!("No messages found; a merge would fail");
    }
}
