//! Pricing Benchmarks - Quote Hot Path
//!
//! Every slider move on the quote screen prices one trade and recomputes
//! the effective liquidity, so these must stay well under a microsecond.
//!
//! Run with: cargo bench --bench lmsr_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use liqpass_pricing::domain::adaptive::{effective_b, LiquidityInputs, Phase};
use liqpass_pricing::domain::lmsr::{quote, BinaryLmsrQuoter};
use liqpass_pricing::domain::MarketSnapshot;

/// Benchmark a YES quote through the free function.
fn bench_quote_yes(c: &mut Criterion) {
    c.bench_function("lmsr_quote_yes_10_shares", |b| {
        b.iter(|| quote(black_box(0.62), black_box(50.0), black_box(10.0)));
    });
}

/// Benchmark a NO quote.
fn bench_quote_no(c: &mut Criterion) {
    let quoter = BinaryLmsrQuoter::new(50.0);

    c.bench_function("lmsr_quote_no_10_shares", |b| {
        b.iter(|| quoter.quote_no(black_box(0.62), black_box(10.0)));
    });
}

/// Benchmark the closed-form budget to shares inversion.
fn bench_shares_for_spend(c: &mut Criterion) {
    let quoter = BinaryLmsrQuoter::new(50.0);

    c.bench_function("lmsr_shares_for_spend", |b| {
        b.iter(|| quoter.shares_for_spend(black_box(0.35), black_box(25.0)));
    });
}

/// Benchmark the adaptive-b heuristic, including decimal rounding.
fn bench_effective_b(c: &mut Criterion) {
    let inputs = LiquidityInputs::new(60.0, Phase::P2).with_activity(12_500.0, 85.0, 7.5);

    c.bench_function("adaptive_effective_b", |b| {
        b.iter(|| effective_b(black_box(&inputs)));
    });
}

/// Benchmark a full market preview board (effective b + 4 quotes).
fn bench_market_preview(c: &mut Criterion) {
    let market = MarketSnapshot {
        id: "solar-m1".to_string(),
        project: "Community Solar".to_string(),
        milestone: "Panels installed".to_string(),
        p_yes: 0.45,
        base_b: 60.0,
        phase: Phase::P2,
        volume_24h: 12_500.0,
        traders_24h: 85.0,
        abs_change: 7.5,
    };
    let sizes = [1.0, 10.0, 50.0, 100.0];

    c.bench_function("market_preview_4_sizes", |b| {
        b.iter(|| market.preview(black_box(&sizes)));
    });
}

criterion_group!(
    benches,
    bench_quote_yes,
    bench_quote_no,
    bench_shares_for_spend,
    bench_effective_b,
    bench_market_preview,
);
criterion_main!(benches);
