//! Criterion benchmarks for log_relay

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use log_relay::prelude::*;
use log_relay::{ExceptionPolicy, RelayQueue};
use std::sync::Arc;

// ============================================================================
// Record Creation Benchmarks
// ============================================================================

fn bench_record_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_creation");
    group.throughput(Throughput::Elements(1));

    group.bench_function("plain", |b| {
        b.iter(|| black_box(LogRecord::new("app", LogLevel::Info, "request processed")));
    });

    group.bench_function("with_context", |b| {
        b.iter(|| {
            let context = LogContext::new()
                .with_field("user_id", 42)
                .with_field("path", "/api/users");
            black_box(LogRecord::new("app", LogLevel::Info, "request processed").with_context(context))
        });
    });

    group.finish();
}

// ============================================================================
// Queue Benchmarks
// ============================================================================

fn bench_queue_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_push");
    group.throughput(Throughput::Elements(1_000));

    group.bench_function("unbounded", |b| {
        b.iter_batched(
            || RelayQueue::unbounded(Arc::new(RelayMetrics::new())),
            |queue| {
                for _ in 0..1_000 {
                    queue.push(LogRecord::new("app", LogLevel::Info, "queued"));
                }
                black_box(queue.len())
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("bounded_drop_oldest", |b| {
        b.iter_batched(
            || {
                RelayQueue::bounded(
                    128,
                    OverflowPolicy::DropOldest,
                    None,
                    Arc::new(RelayMetrics::new()),
                )
                .unwrap()
            },
            |queue| {
                for _ in 0..1_000 {
                    queue.push(LogRecord::new("app", LogLevel::Info, "queued"));
                }
                black_box(queue.len())
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ============================================================================
// End-to-end Benchmarks
// ============================================================================

fn bench_relay_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("relay_emit");
    group.throughput(Throughput::Elements(1));

    let registry = LoggerRegistry::new();
    let relay = Relay::builder()
        .sink(MemorySink::new().with_threshold(LogLevel::Fatal))
        .build(&registry)
        .unwrap();
    let shutdown = relay.start().unwrap();
    let logger = registry.get_logger("app");

    group.bench_function("info", |b| {
        b.iter(|| logger.info(black_box("request processed")));
    });

    group.bench_function("filtered_by_logger_level", |b| {
        b.iter(|| logger.debug(black_box("not emitted")));
    });

    group.finish();
    let _ = shutdown.stop();
}

fn bench_exception_policy(c: &mut Criterion) {
    let policy = ExceptionPolicy::new(LogExceptions::OnlyWhenDebugEnabled)
        .with_exclusion(404_u16)
        .with_exclusion("ValidationError");
    let record = LogRecord::new("app", LogLevel::Error, "failed")
        .with_error(ErrorReport::new("HttpError", "boom").with_status(500).with_trace("trace"));

    c.bench_function("should_include_trace", |b| {
        b.iter(|| black_box(policy.should_include_trace(&record, LogLevel::Info)));
    });
}

criterion_group!(
    benches,
    bench_record_creation,
    bench_queue_push,
    bench_relay_emit,
    bench_exception_policy
);
criterion_main!(benches);
