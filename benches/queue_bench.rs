//! Criterion benchmark for the priority queue hot path.

use std::time::Duration;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use taskyard::core::{PriorityQueue, Task};

fn filled_queue(len: u32) -> PriorityQueue {
    let mut queue = PriorityQueue::new();
    for i in 0..len {
        let priority = u8::try_from(i % 10).unwrap() + 1;
        queue.push(Task::simulated(priority, Duration::from_millis(0), false));
    }
    queue
}

fn bench_push(c: &mut Criterion) {
    c.bench_function("queue_push_1k_mixed_priorities", |b| {
        b.iter_batched(
            PriorityQueue::new,
            |mut queue| {
                for i in 0..1_000_u32 {
                    let priority = u8::try_from(i % 10).unwrap() + 1;
                    queue.push(Task::simulated(priority, Duration::from_millis(0), false));
                }
                queue
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_drain(c: &mut Criterion) {
    c.bench_function("queue_drain_1k_in_priority_order", |b| {
        b.iter_batched(
            || filled_queue(1_000),
            |mut queue| while queue.pop().is_some() {},
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_push, bench_drain);
criterion_main!(benches);
