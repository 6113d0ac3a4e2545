use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use chrono::Utc;
use rust_decimal_macros::dec;
use spot_trading_engine::strategy::{DynamicTarget, Strategy, WeightedMovingAverage};
use spot_trading_engine::{OrderSide, Order, Position, TickerData};

fn ticker(price: rust_decimal::Decimal) -> TickerData {
    let mut t = TickerData::from_price("BONK", Utc::now(), price);
    t.buy = price;
    t.high = price + dec!(0.01);
    t.low = price - dec!(0.01);
    t
}

fn open_position() -> Position {
    Position::new_long(Order {
        order_id: "bench".into(),
        input_mint: "USDC".into(),
        output_mint: "BONK".into(),
        quantity: dec!(1000),
        price: dec!(0.0001),
        side: OrderSide::Buy,
        timestamp: Utc::now(),
    })
}

fn bench_dynamic_target_tick(c: &mut Criterion) {
    let mut strategy = DynamicTarget::with_defaults();
    let warmup: Vec<TickerData> = (0..40i64).map(|i| ticker(dec!(0.0001) + rust_decimal::Decimal::new(i, 8))).collect();
    strategy.setup(&warmup);
    let position = open_position();

    c.bench_function("dynamic_target_on_market_refresh", |b| {
        b.iter(|| strategy.on_market_refresh(black_box(&ticker(dec!(0.0001))), black_box(Some(dec!(100))), black_box(Some(&position))))
    });
}

fn bench_weighted_ma_tick(c: &mut Criterion) {
    let mut strategy = WeightedMovingAverage::new(25, 100, true, 0, 0);
    let warmup: Vec<TickerData> = (0..100i64)
        .map(|i| {
            let mut t = ticker(dec!(0.0001));
            t.timestamp = Utc::now() + chrono::Duration::seconds(i);
            t
        })
        .collect();
    strategy.setup(&warmup);

    c.bench_function("weighted_ma_on_market_refresh", |b| {
        b.iter(|| strategy.on_market_refresh(black_box(&ticker(dec!(0.00011))), black_box(None), black_box(None)))
    });
}

criterion_group!(benches, bench_dynamic_target_tick, bench_weighted_ma_tick);
criterion_main!(benches);
