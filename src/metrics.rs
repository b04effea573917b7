use std::collections::HashMap;
use std::time::Duration;

use metrics::{counter, gauge, histogram};

use crate::models::{MergedMessage, ResolutionRule};

/// Metrics collection and management.
///
/// Thin wrapper over the `metrics` facade. Nothing is recorded unless the
/// binary installs a recorder.
pub struct MetricsCollector {
    // Source loading metrics
    pub source_rows_total: &'static str,
    pub source_records_skipped_total: &'static str,
    pub source_failures_total: &'static str,

    // Merge metrics
    pub messages_merged_total: &'static str,
    pub resolutions_total: &'static str,
    pub merge_duration: &'static str,
    pub merge_workers: &'static str,

    // Export metrics
    pub export_files_created_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            source_rows_total: "wa_merge_source_rows_total",
            source_records_skipped_total: "wa_merge_source_records_skipped_total",
            source_failures_total: "wa_merge_source_failures_total",

            messages_merged_total: "wa_merge_messages_merged_total",
            resolutions_total: "wa_merge_resolutions_total",
            merge_duration: "wa_merge_merge_duration_seconds",
            merge_workers: "wa_merge_merge_workers",

            export_files_created_total: "wa_merge_export_files_created_total",
        }
    }
}

impl MetricsCollector {
    /// Record rows read from a source
    pub fn record_source_rows(&self, source: &'static str, count: usize) {
        counter!(self.source_rows_total, "source" => source).increment(count as u64);
    }

    /// Record rows or records that were skipped as malformed
    pub fn record_skipped_records(&self, source: &'static str, count: usize) {
        if count > 0 {
            counter!(self.source_records_skipped_total, "source" => source).increment(count as u64);
        }
    }

    /// Record a source that could not be opened or queried
    pub fn record_source_failure(&self, source: &'static str) {
        counter!(self.source_failures_total, "source" => source).increment(1);
    }

    /// Record a finished merge
    pub fn record_merge(&self, merged: &[MergedMessage], duration: Duration, workers: usize) {
        counter!(self.messages_merged_total).increment(merged.len() as u64);
        histogram!(self.merge_duration).record(duration.as_secs_f64());
        gauge!(self.merge_workers).set(workers as f64);

        for (rule, count) in tally_rules(merged) {
            counter!(self.resolutions_total, "rule" => rule.as_str()).increment(count as u64);
        }
    }

    /// Record exported files
    pub fn record_export(&self, format: &'static str, file_count: usize) {
        counter!(self.export_files_created_total, "format" => format).increment(file_count as u64);
    }
}

/// Count how many messages each resolution rule produced
#[must_use]
pub fn tally_rules(merged: &[MergedMessage]) -> HashMap<ResolutionRule, usize> {
    let mut counts = HashMap::new();
    for message in merged {
        *counts.entry(message.resolved_by).or_insert(0) += 1;
    }
    counts
}
