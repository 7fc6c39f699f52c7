//! Sequence extraction throughput benchmark
//!
//! Measures the per-line cost of the processing loop: tokenize, feed the
//! client window, upsert the emitted triple.
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench sequence_throughput
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pathseq::sequence::SequenceTracker;
use pathseq::store::SequenceTable;
use pathseq::tokenizer::tokenize;

const PATHS: [&str; 8] = [
    "/", "/search", "/item/1", "/item/2", "/cart", "/checkout", "/login", "/help",
];

/// Synthetic access log with `clients` interleaved clients
fn synthetic_log(lines: usize, clients: usize) -> Vec<String> {
    (0..lines)
        .map(|i| {
            let client = i % clients;
            let path = PATHS[(i * 7 + client) % PATHS.len()];
            format!(
                "10.0.{}.{} - - [25/Apr/2018:10:00:00 -0700] \"GET {} HTTP/1.1\" 200 512",
                client / 256,
                client % 256,
                path
            )
        })
        .collect()
}

fn bench_tokenize(c: &mut Criterion) {
    let log = synthetic_log(1_000, 50);

    c.bench_function("tokenize_1k_lines", |b| {
        b.iter(|| {
            for line in &log {
                black_box(tokenize(black_box(line)));
            }
        });
    });
}

fn bench_table_upsert(c: &mut Criterion) {
    let mut tracker = SequenceTracker::new();
    let triples: Vec<_> = synthetic_log(10_000, 100)
        .iter()
        .filter_map(|line| tokenize(line))
        .filter_map(|token| tracker.observe(token.client, token.path))
        .collect();

    c.bench_function("table_upsert_10k", |b| {
        b.iter(|| {
            let mut table = SequenceTable::new();
            for triple in &triples {
                table.upsert(black_box(triple));
            }
            black_box(table.len())
        });
    });
}

/// Full processing loop with varying client cardinality
fn bench_process_log(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_log");
    let lines = 10_000;
    group.throughput(Throughput::Elements(lines as u64));

    for clients in [10, 1_000, 10_000] {
        let log = synthetic_log(lines, clients);
        group.bench_with_input(BenchmarkId::from_parameter(clients), &log, |b, log| {
            b.iter(|| {
                let mut tracker = SequenceTracker::new();
                let mut table = SequenceTable::new();
                for line in log {
                    if let Some(token) = tokenize(line) {
                        if let Some(triple) = tracker.observe(token.client, token.path) {
                            table.upsert(&triple);
                        }
                    }
                }
                black_box(table.sorted_desc())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tokenize, bench_table_upsert, bench_process_log);
criterion_main!(benches);
