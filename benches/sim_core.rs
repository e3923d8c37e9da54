use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use duotris::core::SimpleRng;
use duotris::types::{Command, GameConfig, BOARD_WIDTH};
use duotris::{Board, EventBus, GameSnapshot, PlayerEngine};

fn bench_gravity_step(c: &mut Criterion) {
    c.bench_function("engine_gravity_step", |b| {
        let mut engine = PlayerEngine::new(0, GameConfig::default(), Arc::new(EventBus::new()));
        engine.start();
        let delay = engine.gravity_delay_ms();
        b.iter(|| black_box(engine.step(delay)));
    });
}

fn bench_hard_drop_playout(c: &mut Criterion) {
    c.bench_function("engine_hard_drop_playout", |b| {
        b.iter(|| {
            let mut engine =
                PlayerEngine::new(0, GameConfig::default(), Arc::new(EventBus::new()));
            engine.start();
            for _ in 0..50 {
                engine.command(Command::HardDrop);
            }
            black_box(engine.snapshot().score)
        });
    });
}

fn bench_random_session(c: &mut Criterion) {
    c.bench_function("engine_random_session", |b| {
        b.iter(|| {
            let mut rng = SimpleRng::new(42);
            let mut engine =
                PlayerEngine::new(0, GameConfig::default(), Arc::new(EventBus::new()));
            engine.start();
            for _ in 0..200 {
                let cmd = match rng.next_range(5) {
                    0 => Command::Left,
                    1 => Command::Right,
                    2 => Command::Rotate,
                    3 => Command::SoftDrop,
                    _ => Command::HardDrop,
                };
                engine.command(cmd);
                let delay = engine.gravity_delay_ms();
                engine.step(delay);
            }
            black_box(engine.snapshot().lines)
        });
    });
}

fn bench_row_clear(c: &mut Criterion) {
    c.bench_function("board_clear_four_rows", |b| {
        b.iter(|| {
            let mut board = Board::new();
            for y in 16..20 {
                for x in 0..BOARD_WIDTH {
                    board.set_cell(x, y, 1);
                }
            }
            let full = board.full_rows();
            board.clear_rows(&full);
            black_box(board.occupied_count())
        });
    });
}

fn bench_snapshot_refill(c: &mut Criterion) {
    c.bench_function("snapshot_refill", |b| {
        let mut engine = PlayerEngine::new(0, GameConfig::default(), Arc::new(EventBus::new()));
        engine.start();
        let mut snap = GameSnapshot::empty(0);
        b.iter(|| {
            engine.snapshot_into(&mut snap);
            black_box(snap.tick)
        });
    });
}

criterion_group!(
    benches,
    bench_gravity_step,
    bench_hard_drop_playout,
    bench_random_session,
    bench_row_clear,
    bench_snapshot_refill
);
criterion_main!(benches);
