use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use matchbook_rs::prelude::*;
use rust_decimal::Decimal;
use std::hint::black_box;

fn limit(side: Side, price: u32, quantity: u32) -> Order {
    Order::new(
        "BENCH",
        OrderType::Limit,
        side,
        Decimal::from(quantity),
        Some(Decimal::from(price)),
        None,
    )
    .unwrap()
}

/// Seed an engine with asks spread across `levels` price levels.
fn seeded_engine(levels: u32, orders_per_level: u32) -> MatchingEngine {
    let engine = MatchingEngine::new("BENCH");
    for level in 0..levels {
        for _ in 0..orders_per_level {
            let mut ask = limit(Side::Sell, 50_000 + level, 1);
            engine.process(&mut ask).unwrap();
        }
    }
    engine
}

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("MatchingEngine");

    // An aggressive buy sweeping a varying number of price levels.
    for &levels in &[1u32, 10, 100] {
        group.bench_with_input(
            BenchmarkId::new("market_sweep", levels),
            &levels,
            |b, &levels| {
                b.iter_with_setup(
                    || {
                        let engine = seeded_engine(levels, 1);
                        let order = Order::new(
                            "BENCH",
                            OrderType::Market,
                            Side::Buy,
                            Decimal::from(levels),
                            None,
                            None,
                        )
                        .unwrap();
                        (engine, order)
                    },
                    |(engine, mut order)| {
                        let trades = black_box(engine.process(&mut order).unwrap());
                        assert_eq!(trades.len(), levels as usize);
                    },
                );
            },
        );
    }

    // Resting a limit order into a busy book.
    group.bench_function("rest_limit_order", |b| {
        b.iter_with_setup(
            || (seeded_engine(100, 2), limit(Side::Buy, 40_000, 1)),
            |(engine, mut order)| {
                black_box(engine.process(&mut order).unwrap());
            },
        );
    });

    // Cancel by id in a book with many resting orders.
    group.bench_function("cancel_resting_order", |b| {
        b.iter_with_setup(
            || {
                let engine = seeded_engine(100, 2);
                let mut target = limit(Side::Sell, 55_000, 1);
                engine.process(&mut target).unwrap();
                (engine, target.order_id)
            },
            |(engine, order_id)| {
                black_box(engine.cancel(order_id)).unwrap();
            },
        );
    });

    group.finish();
}

criterion_group!(benches, bench_matching);
criterion_main!(benches);
