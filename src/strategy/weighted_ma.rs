//! `WeightedMovingAverageStrategy` (spec §4.5), grounded on
//! `original_source/trader/trading_strategy.py::WeightedMovingAverageStrategy`.
//! Buys only; selling is left to whatever sell-side strategy the composer
//! pairs this with (mirrors the original's own doc comment).

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::models::{OrderSide, OrderSignal, Position, TickerData};

use super::Strategy;

/// Linear-weighted moving average over the last `window` prices of
/// `prices`, after dropping the most recent `shift_past` entries. `None` if
/// there are not enough prices left to fill `window`.
fn weighted_moving_average(prices: &[Decimal], window: usize, shift_past: usize) -> Option<Decimal> {
    if window == 0 {
        return None;
    }
    let truncated = if shift_past > 0 {
        if prices.len() <= shift_past {
            return None;
        }
        &prices[..prices.len() - shift_past]
    } else {
        prices
    };
    if truncated.len() < window {
        return None;
    }
    let slice = &truncated[truncated.len() - window..];
    let weight_sum: u64 = (1..=window as u64).sum();
    let weighted: Decimal = slice.iter().enumerate().map(|(i, p)| *p * Decimal::from((i + 1) as u64)).sum();
    Some(weighted / Decimal::from(weight_sum))
}

pub struct WeightedMovingAverage {
    pub short_window: usize,
    pub long_window: usize,
    pub buy_when_short_below: bool,
    pub period_seconds: i64,
    pub shift_past: usize,

    price_history: Vec<Decimal>,
    last_sample_at: Option<DateTime<Utc>>,
}

impl WeightedMovingAverage {
    pub fn new(
        short_window: usize,
        long_window: usize,
        buy_when_short_below: bool,
        period_seconds: i64,
        shift_past: usize,
    ) -> Self {
        Self {
            short_window,
            long_window,
            buy_when_short_below,
            period_seconds,
            shift_past,
            price_history: Vec::new(),
            last_sample_at: None,
        }
    }

    /// Records `price` at `timestamp`: appends a new sample once `period`
    /// seconds have elapsed since the last one, otherwise overwrites the
    /// most recent slot so the window stays tied to wall-clock (or replay)
    /// time rather than tick frequency.
    fn record_sample(&mut self, price: Decimal, timestamp: DateTime<Utc>) {
        let due = self
            .last_sample_at
            .map(|last| timestamp >= last + Duration::seconds(self.period_seconds))
            .unwrap_or(true);

        if due {
            self.price_history.push(price);
            self.last_sample_at = Some(timestamp);
            let cap = self.long_window + self.shift_past;
            if self.price_history.len() > cap {
                self.price_history.remove(0);
            }
        } else if let Some(last) = self.price_history.last_mut() {
            *last = price;
        } else {
            self.price_history.push(price);
            self.last_sample_at = Some(timestamp);
        }
    }
}

impl Strategy for WeightedMovingAverage {
    fn setup(&mut self, history: &[TickerData]) {
        for ticker in history {
            self.record_sample(ticker.last, ticker.timestamp);
        }
    }

    fn on_market_refresh(
        &mut self,
        ticker: &TickerData,
        _balance: Option<Decimal>,
        current_position: Option<&Position>,
    ) -> Option<OrderSignal> {
        self.record_sample(ticker.last, ticker.timestamp);

        if current_position.is_some() || self.price_history.len() < self.long_window {
            return None;
        }

        let short_wma = weighted_moving_average(&self.price_history, self.short_window, self.shift_past)?;
        let long_wma = weighted_moving_average(&self.price_history, self.long_window, self.shift_past)?;

        ((short_wma < long_wma) == self.buy_when_short_below).then(|| OrderSignal::new(OrderSide::Buy))
    }

    fn calculate_quantity(&self, balance: Decimal, price: Decimal) -> Decimal {
        balance * Decimal::new(8, 1) / price
    }
}
