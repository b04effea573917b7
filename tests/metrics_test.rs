//! Unit tests for metrics.rs module

use std::time::Duration;

use chrono::DateTime;
use wa_history_merge::metrics::{tally_rules, MetricsCollector};
use wa_history_merge::models::{MergedMessage, MessageRecord, ResolutionRule};

fn merged(id: i64, rule: ResolutionRule) -> MergedMessage {
    MergedMessage {
        record: MessageRecord {
            message_id: id,
            chat_id: None,
            is_outgoing: false,
            timestamp: DateTime::from_timestamp_millis(1_700_000_000_000).expect("Valid timestamp"),
            text: None,
            chat_identity_id: None,
            chat_subject: None,
            message_type: 0,
            media_mime_type: None,
        },
        raw_identity: None,
        resolved_contact_name: "Unknown".to_string(),
        resolved_by: rule,
    }
}

#[test]
fn test_metric_names_share_prefix() {
    let collector = MetricsCollector::default();
    let names = [
        collector.source_rows_total,
        collector.source_records_skipped_total,
        collector.source_failures_total,
        collector.messages_merged_total,
        collector.resolutions_total,
        collector.merge_duration,
        collector.merge_workers,
        collector.export_files_created_total,
    ];
    assert!(names.iter().all(|name| name.starts_with("wa_merge_")));
}

#[test]
fn test_metric_names_are_unique() {
    let collector = MetricsCollector::default();
    let mut names = vec![
        collector.source_rows_total,
        collector.source_records_skipped_total,
        collector.source_failures_total,
        collector.messages_merged_total,
        collector.resolutions_total,
        collector.merge_duration,
        collector.merge_workers,
        collector.export_files_created_total,
    ];
    let total = names.len();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), total);
}

#[test]
fn test_tally_rules_counts_each_rule() {
    let messages = vec![
        merged(1, ResolutionRule::Subject),
        merged(2, ResolutionRule::Fallback),
        merged(3, ResolutionRule::Subject),
        merged(4, ResolutionRule::AddressBookSuffix),
    ];

    let counts = tally_rules(&messages);

    assert_eq!(counts.get(&ResolutionRule::Subject), Some(&2));
    assert_eq!(counts.get(&ResolutionRule::Fallback), Some(&1));
    assert_eq!(counts.get(&ResolutionRule::AddressBookSuffix), Some(&1));
    assert_eq!(counts.get(&ResolutionRule::Directory), None);
    assert_eq!(counts.values().sum::<usize>(), messages.len());
}

#[test]
fn test_tally_rules_empty() {
    assert!(tally_rules(&[]).is_empty());
}

#[test]
fn test_rule_labels_are_distinct() {
    let mut labels: Vec<&str> = ResolutionRule::ALL.iter().map(|rule| rule.as_str()).collect();
    labels.sort_unstable();
    labels.dedup();
    assert_eq!(labels.len(), ResolutionRule::ALL.len());
}

#[test]
fn test_recording_never_panics() {
    let collector = MetricsCollector::default();
    let messages = vec![merged(1, ResolutionRule::Directory)];

    collector.record_source_rows("message_store", 10);
    collector.record_skipped_records("message_store", 2);
    collector.record_source_failure("contact_directory");
    collector.record_merge(&messages, Duration::from_millis(12), 4);
    collector.record_export("csv", 3);
}
