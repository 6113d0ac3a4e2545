//! `TargetPercentStrategy` (spec §4.5), grounded on
//! `original_source/trader/trading_strategy.py::TargetPercentStrategy`.
//! Emits Buy unconditionally when flat; real entry gating is left to
//! whatever buy-side strategies share the composer with this one.

use rust_decimal::Decimal;

use crate::models::{OrderSide, OrderSignal, Position, TickerData};

use super::Strategy;

pub struct TargetPercent {
    pub target_percent: Decimal,
    pub balance_percent: Decimal,
}

impl TargetPercent {
    pub fn new(target_percent: Decimal, balance_percent: Decimal) -> Self {
        Self { target_percent, balance_percent }
    }

    pub fn with_defaults(target_percent: Decimal) -> Self {
        Self::new(target_percent, Decimal::from(80))
    }
}

impl Strategy for TargetPercent {
    fn on_market_refresh(
        &mut self,
        ticker: &TickerData,
        _balance: Option<Decimal>,
        current_position: Option<&Position>,
    ) -> Option<OrderSignal> {
        let current_price = ticker.buy;

        match current_position {
            None => Some(OrderSignal::new(OrderSide::Buy)),
            Some(position) => {
                let profit_percent =
                    (current_price - position.entry_order.price) / current_price * Decimal::ONE_HUNDRED;
                (profit_percent >= self.target_percent)
                    .then(|| OrderSignal::with_quantity(OrderSide::Sell, position.entry_order.quantity))
            }
        }
    }

    fn calculate_quantity(&self, balance: Decimal, price: Decimal) -> Decimal {
        if balance >= Decimal::from(5) {
            Decimal::from(5) / price
        } else {
            balance * (self.balance_percent / Decimal::ONE_HUNDRED) / price
        }
    }
}
