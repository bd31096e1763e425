//! Benchmarks for grid and chat apply throughput.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use weave_crdt::{ChatCrdt, Direction, GridCrdt};
use weave_types::ReplicaId;

fn benchmark_grid_set_letter(c: &mut Criterion) {
    let mut group = c.benchmark_group("Grid set_letter");

    group.bench_function("sequential_writes", |b| {
        b.iter(|| {
            let mut grid = GridCrdt::new(15, 15, ReplicaId::new());
            for row in 0..15 {
                for col in 0..15 {
                    black_box(grid.set_letter(row, col, Some('A'), "bench").unwrap());
                }
            }
        })
    });

    group.finish();
}

fn benchmark_grid_add_word(c: &mut Criterion) {
    let mut group = c.benchmark_group("Grid add_word");

    group.bench_function("horizontal_word", |b| {
        b.iter(|| {
            let mut grid = GridCrdt::new(15, 15, ReplicaId::new());
            black_box(
                grid.add_word("clue", "CROSSWORD", 0, 0, Direction::Horizontal, "bench")
                    .unwrap(),
            );
        })
    });

    group.finish();
}

fn benchmark_grid_remote_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("Grid remote apply");

    group.bench_function("apply_op_log_from_peer", |b| {
        b.iter(|| {
            let mut origin = GridCrdt::new(15, 15, ReplicaId::new());
            for row in 0..15 {
                for col in 0..15 {
                    origin.set_letter(row, col, Some('Z'), "origin").unwrap();
                }
            }
            let ops = origin.ops_since(None);

            let mut replica = GridCrdt::new(15, 15, ReplicaId::new());
            for op in ops {
                black_box(replica.apply_remote_op(op));
            }
        })
    });

    group.finish();
}

fn benchmark_chat_send(c: &mut Criterion) {
    let mut group = c.benchmark_group("Chat send");

    group.bench_function("1000_messages", |b| {
        b.iter(|| {
            let mut chat = ChatCrdt::new(ReplicaId::new());
            for i in 0..1000 {
                black_box(chat.send(&format!("message {i}"), "bench"));
            }
        })
    });

    group.finish();
}

fn benchmark_chat_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("Chat search");

    let mut chat = ChatCrdt::new(ReplicaId::new());
    for i in 0..1000 {
        chat.send(&format!("message number {i} about widgets"), "bench");
    }

    group.bench_function("substring_match", |b| {
        b.iter(|| black_box(chat.search("widgets")))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_grid_set_letter,
    benchmark_grid_add_word,
    benchmark_grid_remote_apply,
    benchmark_chat_send,
    benchmark_chat_search,
);

criterion_main!(benches);
