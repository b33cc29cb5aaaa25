//! Benchmarks for phone classification and batch processing
//!
//! Run with: cargo bench --package cdr-services
//!
//! These measure the pure pipeline (no file or database I/O).

use cdr_core::{config::Verbosity, models::RawCdrRecord};
use cdr_services::{classify, AlertPolicy, BatchReporter, BatchRunner, RecordProcessor};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const SAMPLE_NUMBERS: [&str; 8] = [
    "5551234567",
    "+1 (555) 123-4567",
    "15551234567",
    "911",
    "12345",
    "0000000000",
    "0551234567",
    "not a number",
];

/// Create a mock raw row
fn create_mock_row(i: usize) -> RawCdrRecord {
    RawCdrRecord {
        start_time: Some("2025-01-13T10:00:00Z".to_string()),
        bill_duration: Some(format!("{}", i % 600)),
        call_price: Some("0.0125".to_string()),
        ani: Some(SAMPLE_NUMBERS[i % SAMPLE_NUMBERS.len()].to_string()),
        dnis: Some(SAMPLE_NUMBERS[(i + 3) % SAMPLE_NUMBERS.len()].to_string()),
        customer_ip: Some("10.0.0.1".to_string()),
        call_type: Some("outbound".to_string()),
        lrn: Some("5550000000".to_string()),
    }
}

/// Benchmark single-value classification
fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    for input in SAMPLE_NUMBERS.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(input), input, |b, input| {
            b.iter(|| classify(black_box(*input)));
        });
    }

    group.finish();
}

/// Benchmark whole batches through the runner
fn bench_batch_run(c: &mut Criterion) {
    let runner = BatchRunner::new(
        RecordProcessor::new(chrono_tz::America::Los_Angeles),
        BatchReporter::new(AlertPolicy::default()),
    );

    let mut group = c.benchmark_group("batch_run");

    for size in [100usize, 1_000, 10_000].iter() {
        let rows: Vec<RawCdrRecord> = (0..*size).map(create_mock_row).collect();

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let outcome = runner.run(
                    "bench",
                    rows.iter().cloned().map(Ok),
                    Verbosity::Quiet,
                );
                black_box(outcome.records.len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classify, bench_batch_run);
criterion_main!(benches);
