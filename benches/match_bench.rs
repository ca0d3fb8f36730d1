//! Full-match throughput on the virtual clock: matches per second, single match and batch.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use diceduel::catalog::CardCatalog;
use diceduel::config::TimingConfig;
use diceduel::parallel::{simulate_match, simulate_matchup};

fn bench_single_match(c: &mut Criterion) {
    let catalog = CardCatalog::builtin();
    let player = catalog.default_player();
    let enemy = catalog.default_enemy();
    let mut seed = 0_u64;

    let mut group = c.benchmark_group("match");
    group.throughput(Throughput::Elements(1));
    group.bench_function("fang_vs_pearl", |b| {
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(simulate_match(player, enemy, TimingConfig::default(), black_box(seed)))
        })
    });
    group.finish();
}

fn bench_matchup_batch(c: &mut Criterion) {
    let catalog = CardCatalog::builtin();
    let player = catalog.default_player();
    let enemy = catalog.default_enemy();
    let matches = 1_000;

    let mut group = c.benchmark_group("matchup");
    group.throughput(Throughput::Elements(matches as u64));
    group.sample_size(20);
    group.bench_function("parallel_1000", |b| {
        b.iter(|| {
            black_box(simulate_matchup(
                player,
                enemy,
                TimingConfig::default(),
                matches,
                7,
            ))
        })
    });
    group.finish();
}

criterion_group!(benches, bench_single_match, bench_matchup_batch);
criterion_main!(benches);
