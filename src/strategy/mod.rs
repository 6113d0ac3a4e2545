//! C5: pluggable trading strategies (spec §4.5). `Strategy` is the contract
//! every variant satisfies; `Composer` combines several into one. Grounded
//! line-for-line on `original_source/trader/trading_strategy.py`.

mod composer;
mod dynamic_target;
mod random;
mod target_percent;
mod target_value;
mod trailing_stop;
mod weighted_ma;

pub use composer::Composer;
pub use dynamic_target::DynamicTarget;
pub use random::Random;
pub use target_percent::TargetPercent;
pub use target_value::TargetValue;
pub use trailing_stop::TrailingStopLoss;
pub use weighted_ma::WeightedMovingAverage;

use rust_decimal::Decimal;

use crate::models::{OrderSignal, Position, TickerData};

/// The strategy contract (spec §4.5): a warm-up hook, a per-tick evaluation,
/// and a default sizing formula used when a signal carries no explicit
/// quantity. Strategies hold mutable internal state (rolling windows,
/// latches) and must not be shared across engines.
pub trait Strategy: Send {
    /// Called once at engine start with recent candles, for strategies that
    /// need a warm-up window (e.g. moving averages).
    fn setup(&mut self, _history: &[TickerData]) {}

    fn on_market_refresh(
        &mut self,
        ticker: &TickerData,
        balance: Option<Decimal>,
        current_position: Option<&Position>,
    ) -> Option<OrderSignal>;

    /// Default sizing used by the trading loop when a signal's `quantity` is
    /// `None` (spec §4.6).
    fn calculate_quantity(&self, balance: Decimal, price: Decimal) -> Decimal;
}

/// A boxed, dynamically-dispatched strategy — what the trading loop and
/// `Composer` hold children as, since the concrete variant is chosen at
/// configuration time (spec §6, "strategy selection").
pub type BoxedStrategy = Box<dyn Strategy>;
