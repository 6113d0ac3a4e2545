//! `RandomStrategy` (spec §4.5), grounded on
//! `original_source/trader/trading_strategy.py::RandomStrategy`.

use rand::Rng;
use rust_decimal::Decimal;

use crate::models::{OrderSide, OrderSignal, Position, TickerData};

use super::Strategy;

/// Emits Buy/Sell purely on a coin flip, parameterized by chance out of 100.
/// Useful as a baseline / test fixture rather than a serious strategy.
pub struct Random {
    pub buy_chance: u8,
    pub sell_chance: u8,
}

impl Random {
    pub fn new(buy_chance: u8, sell_chance: u8) -> Self {
        Self { buy_chance, sell_chance }
    }
}

impl Strategy for Random {
    fn on_market_refresh(
        &mut self,
        _ticker: &TickerData,
        _balance: Option<Decimal>,
        current_position: Option<&Position>,
    ) -> Option<OrderSignal> {
        let roll: u8 = rand::thread_rng().gen_range(1..=100);
        match current_position {
            None => (roll <= self.buy_chance).then(|| OrderSignal::new(OrderSide::Buy)),
            Some(position) => (roll <= self.sell_chance)
                .then(|| OrderSignal::with_quantity(OrderSide::Sell, position.entry_order.quantity)),
        }
    }

    fn calculate_quantity(&self, balance: Decimal, price: Decimal) -> Decimal {
        balance * Decimal::new(5, 1) / price
    }
}
