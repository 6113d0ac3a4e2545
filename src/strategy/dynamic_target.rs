//! `DynamicTargetStrategy` (spec §4.5): EMA/ATR-derived buy/sell/stop-loss
//! targets, grounded on
//! `original_source/trader/trading_strategy.py::DynamicTargetStrategy`.

use rust_decimal::Decimal;

use crate::models::{OrderSide, OrderSignal, Position, TickerData};

use super::Strategy;

/// Simple mean of the last `period` True Ranges, where
/// `TR(i) = max(high-low, |high-prev.last|, |low-prev.last|)` (spec §4.5).
/// Returns `None` until `history` holds at least `period + 1` ticks.
pub fn compute_atr(history: &[TickerData], period: usize) -> Option<Decimal> {
    if period == 0 || history.len() < period + 1 {
        return None;
    }
    let start = history.len() - period - 1;
    let window = &history[start..];
    let sum: Decimal = window
        .windows(2)
        .map(|pair| {
            let prev = &pair[0];
            let cur = &pair[1];
            (cur.high - cur.low)
                .max((cur.high - prev.last).abs())
                .max((cur.low - prev.last).abs())
        })
        .sum();
    Some(sum / Decimal::from(period as u64))
}

/// EMA of `prices`, seeded from the SMA of the first `period` values and
/// updated incrementally with `alpha = 2/(period+1)` thereafter. Standalone
/// reference used by tests to check the strategy's incremental bookkeeping.
pub fn compute_ema(prices: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || prices.len() < period {
        return None;
    }
    let seed: Decimal = prices[..period].iter().sum::<Decimal>() / Decimal::from(period as u64);
    let alpha = Decimal::TWO / Decimal::from((period + 1) as u64);
    let mut ema = seed;
    for price in &prices[period..] {
        ema = alpha * *price + (Decimal::ONE - alpha) * ema;
    }
    Some(ema)
}

pub struct DynamicTarget {
    pub ema_period: usize,
    pub atr_period: usize,
    pub buy_factor: Decimal,
    pub sell_factor: Decimal,
    pub stop_loss_atr_factor: Decimal,
    pub balance_percent: Decimal,

    history: Vec<TickerData>,
    ema: Option<Decimal>,
}

impl DynamicTarget {
    pub fn new(
        ema_period: usize,
        atr_period: usize,
        buy_factor: Decimal,
        sell_factor: Decimal,
        stop_loss_atr_factor: Decimal,
        balance_percent: Decimal,
    ) -> Self {
        Self {
            ema_period,
            atr_period,
            buy_factor,
            sell_factor,
            stop_loss_atr_factor,
            balance_percent,
            history: Vec::new(),
            ema: None,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(20, 14, Decimal::new(15, 1), Decimal::new(15, 1), Decimal::from(3), Decimal::from(80))
    }

    fn window_capacity(&self) -> usize {
        self.ema_period.max(self.atr_period) + 1
    }

    fn push(&mut self, ticker: TickerData) {
        self.history.push(ticker);
        if self.history.len() > self.window_capacity() {
            self.history.remove(0);
        }
    }

    fn try_seed_ema(&mut self) {
        if self.ema.is_some() || self.history.len() < self.ema_period {
            return;
        }
        let window = &self.history[self.history.len() - self.ema_period..];
        let sum: Decimal = window.iter().map(|t| t.last).sum();
        self.ema = Some(sum / Decimal::from(self.ema_period as u64));
    }

    fn update_ema(&mut self, latest_price: Decimal) {
        if let Some(ema) = self.ema {
            let alpha = Decimal::TWO / Decimal::from((self.ema_period + 1) as u64);
            self.ema = Some(alpha * latest_price + (Decimal::ONE - alpha) * ema);
        }
    }
}

impl Strategy for DynamicTarget {
    fn setup(&mut self, history: &[TickerData]) {
        for ticker in history {
            self.push(ticker.clone());
        }
        self.try_seed_ema();
    }

    fn on_market_refresh(
        &mut self,
        ticker: &TickerData,
        _balance: Option<Decimal>,
        current_position: Option<&Position>,
    ) -> Option<OrderSignal> {
        let already_seeded = self.ema.is_some();
        self.push(ticker.clone());

        if already_seeded {
            self.update_ema(ticker.last);
        } else {
            self.try_seed_ema();
        }

        if self.history.len() < self.ema_period.max(self.atr_period) {
            return None;
        }

        let ema = self.ema?;
        let atr = compute_atr(&self.history, self.atr_period)?;

        let buy_target = ema - atr * self.buy_factor;
        let sell_target = ema + atr * self.sell_factor;
        let stop_loss = ema - atr * self.stop_loss_atr_factor;
        let last = ticker.last;

        match current_position {
            None => (last <= buy_target).then(|| OrderSignal::new(OrderSide::Buy)),
            Some(position) => (last >= sell_target || last <= stop_loss)
                .then(|| OrderSignal::with_quantity(OrderSide::Sell, position.entry_order.quantity)),
        }
    }

    fn calculate_quantity(&self, balance: Decimal, price: Decimal) -> Decimal {
        balance * (self.balance_percent / Decimal::ONE_HUNDRED) / price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Order;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn tick(i: i64, last: Decimal, high: Decimal, low: Decimal) -> TickerData {
        let mut t = TickerData::from_price("SOL", Utc.timestamp_opt(1_700_000_000 + i, 0).unwrap(), last);
        t.high = high;
        t.low = low;
        t
    }

    fn flat_series(prices: &[Decimal]) -> Vec<TickerData> {
        prices.iter().enumerate().map(|(i, p)| tick(i as i64, *p, *p + dec!(0.5), *p - dec!(0.5))).collect()
    }

    #[test]
    fn compute_ema_matches_hand_worked_seed_and_update() {
        let prices = [dec!(10), dec!(11), dec!(12), dec!(13)];
        // period=2: seed = avg(10, 11) = 10.5, then alpha = 2/3.
        // step over 12: 2/3*12 + 1/3*10.5 = 11.5
        // step over 13: 2/3*13 + 1/3*11.5 ≈ 12.5
        let ema = compute_ema(&prices, 2).unwrap();
        let alpha = dec!(2) / dec!(3);
        let mut expected = (prices[0] + prices[1]) / dec!(2);
        expected = alpha * prices[2] + (dec!(1) - alpha) * expected;
        expected = alpha * prices[3] + (dec!(1) - alpha) * expected;
        assert_eq!(ema, expected);
    }

    #[test]
    fn compute_atr_is_none_below_window() {
        let history = flat_series(&[dec!(10), dec!(11)]);
        assert!(compute_atr(&history, 2).is_none());
    }

    #[test]
    fn compute_atr_averages_true_ranges() {
        // Three ticks, constant 1-unit high/low spread, prices rising by 1.
        let history = flat_series(&[dec!(10), dec!(11), dec!(12)]);
        let atr = compute_atr(&history, 2).unwrap();
        // TR between tick0->tick1: max(1, |11.5-10|, |10.5-10|) = 1.5
        // TR between tick1->tick2: max(1, |12.5-11|, |11.5-11|) = 1.5
        assert_eq!(atr, dec!(1.5));
    }

    #[test]
    fn does_nothing_before_warm_up() {
        let mut strategy = DynamicTarget::new(3, 2, dec!(1.5), dec!(1.5), dec!(3), dec!(80));
        let signal = strategy.on_market_refresh(&tick(0, dec!(10), dec!(10.5), dec!(9.5)), None, None);
        assert!(signal.is_none());
        assert!(strategy.ema.is_none());
    }

    #[test]
    fn buys_once_warm_and_price_at_or_below_buy_target() {
        // A small buy_factor keeps the target close to EMA so a modest dip
        // (rather than one big enough to blow out ATR itself) crosses it.
        let mut strategy = DynamicTarget::new(3, 2, dec!(0.1), dec!(1.5), dec!(3), dec!(80));
        for p in [dec!(10), dec!(10), dec!(10)] {
            strategy.on_market_refresh(&tick(0, p, p + dec!(0.5), p - dec!(0.5)), None, None);
        }
        assert!(strategy.ema.is_some());

        let signal = strategy.on_market_refresh(&tick(4, dec!(8), dec!(8.5), dec!(7.5)), None, None);
        assert_eq!(signal, Some(OrderSignal::new(OrderSide::Buy)));
    }

    #[test]
    fn sells_on_stop_loss_breach_while_open() {
        let mut strategy = DynamicTarget::new(3, 2, dec!(1.5), dec!(1.5), dec!(0.02), dec!(80));
        for p in [dec!(10), dec!(10), dec!(10)] {
            strategy.on_market_refresh(&tick(0, p, p + dec!(0.5), p - dec!(0.5)), None, None);
        }
        let position = Position::new_long(Order {
            order_id: "x".into(),
            input_mint: "IN".into(),
            output_mint: "OUT".into(),
            quantity: dec!(5),
            price: dec!(10),
            side: OrderSide::Buy,
            timestamp: Utc::now(),
        });
        // With a tiny stop_loss_atr_factor, a small dip already trips the
        // stop.
        let signal =
            strategy.on_market_refresh(&tick(4, dec!(9.9), dec!(10.4), dec!(9.4)), None, Some(&position));
        assert_eq!(signal, Some(OrderSignal::with_quantity(OrderSide::Sell, dec!(5))));
    }

    #[test]
    fn sizing_is_balance_percent_over_price() {
        let strategy = DynamicTarget::new(3, 2, dec!(1.5), dec!(1.5), dec!(3), dec!(80));
        assert_eq!(strategy.calculate_quantity(dec!(100), dec!(10)), dec!(8));
    }
}
