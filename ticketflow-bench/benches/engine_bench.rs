//! Ticket engine benchmarks.

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use ticketflow_core::{TicketEngine, TicketPriority, TicketState, TransitionTable};

// Global counter to ensure unique ticket IDs across all benchmark iterations
static TICKET_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Creates a ticket and walks it to IN_PROGRESS, where hold/resume cycle forever.
fn in_progress_ticket(engine: &TicketEngine, id: &str) {
    engine
        .create_ticket(id, "bench", "benchmark ticket", TicketPriority::Medium)
        .unwrap();
    engine.transition(id, "assign", "", Some("bench")).unwrap();
    engine.transition(id, "start_work", "", None).unwrap();
}

fn bench_table_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("table");
    let table = TransitionTable::standard();

    group.bench_function("legal_actions", |b| {
        b.iter(|| {
            for state in TicketState::ALL {
                black_box(table.legal_actions(black_box(state)).len());
            }
        });
    });

    group.finish();
}

fn bench_create_ticket(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_create_ticket");

    const BATCH: u64 = 100;

    group.throughput(Throughput::Elements(BATCH));
    group.bench_function("create", |b| {
        b.iter_batched(
            TicketEngine::new,
            |engine| {
                for _ in 0..BATCH {
                    let id = TICKET_COUNTER.fetch_add(1, Ordering::Relaxed);
                    black_box(
                        engine
                            .create_ticket(
                                &format!("T-{}", id),
                                "Login Issue",
                                "User cannot login",
                                TicketPriority::High,
                            )
                            .unwrap(),
                    );
                }
                engine
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_transition(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_transition");

    const CYCLES: u64 = 100;

    // Fresh engine per batch so history does not grow without bound
    group.throughput(Throughput::Elements(CYCLES * 2));
    group.bench_function("hold_resume", |b| {
        b.iter_batched(
            || {
                let engine = TicketEngine::new();
                in_progress_ticket(&engine, "cycle");
                engine
            },
            |engine| {
                for _ in 0..CYCLES {
                    engine.transition("cycle", "hold", "waiting", None).unwrap();
                    engine.transition("cycle", "resume", "", None).unwrap();
                }
                engine
            },
            BatchSize::SmallInput,
        );
    });

    // Rejected actions take the same lock but never mutate
    let engine = TicketEngine::new();
    in_progress_ticket(&engine, "cycle");
    group.throughput(Throughput::Elements(1));
    group.bench_function("illegal", |b| {
        b.iter(|| black_box(engine.transition("cycle", "close", "", None).is_err()));
    });

    group.finish();
}

fn contended_engine(threads: u64) -> TicketEngine {
    let engine = TicketEngine::new();
    for t in 0..threads {
        in_progress_ticket(&engine, &format!("own-{}", t));
    }
    in_progress_ticket(&engine, "shared");
    engine
}

fn bench_contended_transition(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_contention");
    group.sample_size(20);

    const OPS_PER_THREAD: u64 = 1000;

    for threads in [1u64, 4] {
        group.throughput(Throughput::Elements(threads * OPS_PER_THREAD));

        // Each thread cycles its own ticket
        group.bench_with_input(
            BenchmarkId::new("independent", threads),
            &threads,
            |b, &threads| {
                b.iter_batched(
                    || contended_engine(threads),
                    |engine| {
                        thread::scope(|s| {
                            for t in 0..threads {
                                let engine = &engine;
                                s.spawn(move || {
                                    let id = format!("own-{}", t);
                                    for _ in 0..OPS_PER_THREAD / 2 {
                                        let _ = engine.transition(&id, "hold", "", None);
                                        let _ = engine.transition(&id, "resume", "", None);
                                    }
                                });
                            }
                        });
                        engine
                    },
                    BatchSize::SmallInput,
                );
            },
        );

        // All threads fight over one ticket
        group.bench_with_input(
            BenchmarkId::new("shared", threads),
            &threads,
            |b, &threads| {
                b.iter_batched(
                    || contended_engine(threads),
                    |engine| {
                        thread::scope(|s| {
                            for _ in 0..threads {
                                let engine = &engine;
                                s.spawn(move || {
                                    for _ in 0..OPS_PER_THREAD / 2 {
                                        let _ = engine.transition("shared", "hold", "", None);
                                        let _ = engine.transition("shared", "resume", "", None);
                                    }
                                });
                            }
                        });
                        engine
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_table_lookup,
    bench_create_ticket,
    bench_transition,
    bench_contended_transition,
);

criterion_main!(benches);
