//! Broadcast fan-out benchmark suite.
//!
//! Benchmarks the hub at different membership sizes:
//! - Member counts: 10, 100, 1000
//! - Raw membership fan-out and full increment path through the control loop
//!
//! Run with: cargo bench --bench broadcast
//! Results saved to: target/criterion/

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use live_counter::hub::{Membership, Payload};
use live_counter::{ConnectionId, Hub};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const MEMBER_COUNTS: &[usize] = &[10, 100, 1000];

// ============================================================================
// Benchmark: Membership Fan-out
// ============================================================================

fn bench_membership_broadcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("membership_broadcast");

    for &count in MEMBER_COUNTS {
        group.bench_with_input(BenchmarkId::new("members", count), &count, |b, &count| {
            b.iter_batched(
                || {
                    let mut membership = Membership::new();
                    let receivers: Vec<_> = (0..count)
                        .map(|_| {
                            let (tx, rx) = mpsc::channel(4);
                            membership.register(ConnectionId::next(), tx);
                            rx
                        })
                        .collect();
                    (membership, receivers)
                },
                |(mut membership, receivers)| {
                    let report = membership.broadcast(&Payload::from("42"));
                    (report, membership, receivers)
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Increment Through Control Loop
// ============================================================================

fn bench_hub_increment(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");

    let mut group = c.benchmark_group("hub_increment");

    for &count in MEMBER_COUNTS {
        let hub = rt.block_on(spawn_hub_with_members(count));

        group.bench_with_input(BenchmarkId::new("members", count), &hub, |b, hub| {
            b.to_async(&rt).iter(|| async {
                hub.increment().expect("increment");
            });
        });

        rt.block_on(hub.shutdown());
    }

    group.finish();
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Spawns a hub with `count` members whose queues are drained continuously.
async fn spawn_hub_with_members(count: usize) -> Hub {
    let hub = Hub::spawn(0, 1024);

    for _ in 0..count {
        let (tx, mut rx) = mpsc::channel::<Payload>(hub.queue_capacity());
        hub.register(ConnectionId::next(), tx).expect("register");
        tokio::spawn(async move { while rx.recv().await.is_some() {} });
    }

    hub
}

criterion_group!(benches, bench_membership_broadcast, bench_hub_increment);
criterion_main!(benches);
