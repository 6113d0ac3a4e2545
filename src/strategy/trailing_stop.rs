//! `TrailingStopLossStrategy` (spec §4.5), grounded on
//! `original_source/trader/trading_strategy.py::TrailingStopLossStrategy`.
//! Emits Buy unconditionally when flat; real entry gating is left to
//! whatever buy-side strategies share the composer with this one.

use rust_decimal::Decimal;

use crate::models::{OrderSide, OrderSignal, Position, TickerData};

use super::Strategy;

pub struct TrailingStopLoss {
    pub stop_loss_percent: Decimal,
    pub balance_percent: Decimal,

    highest_price_after_target: Decimal,
}

impl TrailingStopLoss {
    pub fn new(stop_loss_percent: Decimal, balance_percent: Decimal) -> Self {
        Self { stop_loss_percent, balance_percent, highest_price_after_target: Decimal::ZERO }
    }

    pub fn with_defaults() -> Self {
        Self::new(Decimal::ONE, Decimal::from(80))
    }
}

impl Strategy for TrailingStopLoss {
    fn on_market_refresh(
        &mut self,
        ticker: &TickerData,
        _balance: Option<Decimal>,
        current_position: Option<&Position>,
    ) -> Option<OrderSignal> {
        let current_price = ticker.buy;

        match current_position {
            None => {
                self.highest_price_after_target = Decimal::ZERO;
                Some(OrderSignal::new(OrderSide::Buy))
            }
            Some(position) => {
                if current_price > self.highest_price_after_target {
                    self.highest_price_after_target = current_price;
                }
                let drop_percent = (self.highest_price_after_target - current_price)
                    / self.highest_price_after_target
                    * Decimal::ONE_HUNDRED;
                (drop_percent >= self.stop_loss_percent)
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
