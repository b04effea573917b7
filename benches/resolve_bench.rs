//! Criterion benchmarks for name resolution.
//!
//! 1. **address_book**: parsing and indexing a synthetic vCard file.
//! 2. **resolve**: single-message resolution down each precedence path.
//! 3. **merge**: parallel merge of a large message set at several worker counts.
//!
//! ```sh
//! cargo bench -- merge
//! ```

use chrono::DateTime;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use wa_history_merge::address_book::{build_address_book, AddressBookIndex};
use wa_history_merge::merge::{merge_messages, resolve};
use wa_history_merge::models::{ContactDirectory, DirectoryEntry, IdentityIndex, IdentityRecord, MessageRecord};

const CONTACTS: i64 = 2_000;

fn synthetic_vcf(contacts: i64) -> String {
    (0..contacts)
        .map(|i| format!("BEGIN:VCARD\r\nVERSION:3.0\r\nFN:Contact {i}\r\nTEL;TYPE=CELL:+34 6{i:08}\r\nEND:VCARD\r\n"))
        .collect()
}

fn identities(contacts: i64) -> IdentityIndex {
    (0..contacts)
        .map(|i| {
            let local = format!("346{i:08}");
            let record = IdentityRecord {
                identity_id: i,
                raw_identity: Some(format!("{local}@s.whatsapp.net")),
                local_part: Some(local),
            };
            (i, record)
        })
        .collect()
}

fn directory(contacts: i64) -> ContactDirectory {
    // Every tenth identity has a directory name
    (0..contacts)
        .step_by(10)
        .map(|i| {
            let raw = format!("346{i:08}@s.whatsapp.net");
            let entry = DirectoryEntry {
                raw_identity: raw.clone(),
                display_name: Some(format!("Directory {i}")),
                alt_name: None,
            };
            (raw, entry)
        })
        .collect()
}

fn message(id: i64, identity_id: Option<i64>, subject: Option<&str>) -> MessageRecord {
    MessageRecord {
        message_id: id,
        chat_id: identity_id,
        is_outgoing: id % 2 == 0,
        timestamp: DateTime::from_timestamp_millis(1_700_000_000_000 + id).unwrap_or_default(),
        text: Some("hola".to_string()),
        chat_identity_id: identity_id,
        chat_subject: subject.map(str::to_string),
        message_type: 0,
        media_mime_type: None,
    }
}

fn bench_address_book(c: &mut Criterion) {
    let mut group = c.benchmark_group("address_book");
    let text = synthetic_vcf(CONTACTS);
    group.bench_function("build_2000_contacts", |b| b.iter(|| build_address_book(black_box(&text))));
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let book: AddressBookIndex = build_address_book(&synthetic_vcf(CONTACTS)).index;
    let identities = identities(CONTACTS);
    let directory = directory(CONTACTS);

    let cases = [
        ("subject", message(1, Some(3), Some("Family"))),
        ("directory", message(2, Some(10), None)),
        ("address_book_exact", message(3, Some(11), None)),
        ("fallback", message(4, Some(CONTACTS + 1), None)),
    ];
    let unknown = IdentityRecord {
        identity_id: CONTACTS + 1,
        raw_identity: Some("49170000000@s.whatsapp.net".to_string()),
        local_part: None,
    };

    for (name, msg) in &cases {
        let identity = msg.chat_identity_id.and_then(|id| identities.get(&id)).or(Some(&unknown));
        group.bench_function(*name, |b| {
            b.iter(|| resolve(black_box(msg), identity, &directory, &book));
        });
    }
    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    group.sample_size(20);

    let book = build_address_book(&synthetic_vcf(CONTACTS)).index;
    let identities = identities(CONTACTS);
    let directory = directory(CONTACTS);
    let messages: Vec<MessageRecord> = (0..50_000)
        .map(|i| message(i, Some(i % (CONTACTS + 50)), None))
        .collect();

    for workers in [1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::new("50k_messages", workers), &workers, |b, &workers| {
            b.iter(|| merge_messages(black_box(&messages), &identities, &directory, &book, workers));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_address_book, bench_resolve, bench_merge);
criterion_main!(benches);
