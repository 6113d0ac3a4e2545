//! Core data model: tickers, orders, positions. See `mint` for the mint
//! registry and `Mint` type itself.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Candle granularity for `MarketDataSource::get_candles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    FifteenSeconds,
    OneMinute,
    OneHour,
}

impl Interval {
    pub fn as_seconds(self) -> u64 {
        match self {
            Interval::FifteenSeconds => 15,
            Interval::OneMinute => 60,
            Interval::OneHour => 3_600,
        }
    }
}

/// An immutable snapshot of a pair's price, produced either by a streaming
/// last-price update (all fields collapse to the single streamed price,
/// `spread` absent) or by a historical candle (OHLCV populated).
#[derive(Debug, Clone, PartialEq)]
pub struct TickerData {
    pub pair: String,
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub last: Decimal,
    pub buy: Decimal,
    pub sell: Decimal,
    pub vol: Decimal,
    pub spread: Option<Decimal>,
}

impl TickerData {
    /// Build a ticker from a single streamed price, as the streaming
    /// source does: every field collapses to `price`, no spread.
    pub fn from_price(pair: impl Into<String>, timestamp: DateTime<Utc>, price: Decimal) -> Self {
        Self {
            pair: pair.into(),
            timestamp,
            open: price,
            high: price,
            low: price,
            last: price,
            buy: price,
            sell: price,
            vol: Decimal::ZERO,
            spread: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// A strategy's intent for the current tick. `quantity = None` means "use
/// the account's default sizing" (`Strategy::calculate_quantity`).
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSignal {
    pub side: OrderSide,
    pub quantity: Option<Decimal>,
}

impl OrderSignal {
    pub fn new(side: OrderSide) -> Self {
        Self { side, quantity: None }
    }

    pub fn with_quantity(side: OrderSide, quantity: Decimal) -> Self {
        Self { side, quantity: Some(quantity) }
    }
}

/// A record of one executed swap.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Opaque transaction identifier (base58 signature, or a fabricated
    /// unique id in dry-run mode).
    pub order_id: String,
    pub input_mint: String,
    pub output_mint: String,
    /// UI-Decimal quantity: input-token units for a Buy, output-token units
    /// for a Sell (as seen from the position).
    pub quantity: Decimal,
    /// UI-Decimal price of output in terms of input, at execution.
    pub price: Decimal,
    pub side: OrderSide,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionType {
    Long,
    /// Reserved: never produced by this engine. See spec Open Question (b).
    Short,
}

/// An open or closed pairing of an entry order with an optional exit order.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub position_type: PositionType,
    pub entry_order: Order,
    pub exit_order: Option<Order>,
}

impl Position {
    pub fn new_long(entry_order: Order) -> Self {
        Self { position_type: PositionType::Long, entry_order, exit_order: None }
    }

    pub fn is_open(&self) -> bool {
        self.exit_order.is_none()
    }

    /// Defined only while open.
    pub fn unrealized_pnl(&self, current_price: Decimal) -> Decimal {
        (current_price - self.entry_order.price) * self.entry_order.quantity
    }

    pub fn unrealized_pnl_percent(&self, current_price: Decimal) -> Decimal {
        let basis = self.entry_order.price * self.entry_order.quantity;
        self.unrealized_pnl(current_price) / basis * Decimal::ONE_HUNDRED
    }

    /// Defined only once closed; `Decimal::ZERO` while still open.
    pub fn realized_pnl(&self) -> Decimal {
        match &self.exit_order {
            Some(exit) => (exit.price - self.entry_order.price) * self.entry_order.quantity,
            None => Decimal::ZERO,
        }
    }

    pub fn realized_pnl_percent(&self) -> Decimal {
        let basis = self.entry_order.price * self.entry_order.quantity;
        self.realized_pnl() / basis * Decimal::ONE_HUNDRED
    }
}

/// Balance of one mint in the wallet. `available` is what the account may
/// commit to a new order.
#[derive(Debug, Clone, PartialEq)]
pub struct MintBalance {
    pub mint: String,
    pub available: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order(price: Decimal, quantity: Decimal, side: OrderSide) -> Order {
        Order {
            order_id: "x".into(),
            input_mint: "IN".into(),
            output_mint: "OUT".into(),
            quantity,
            price,
            side,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn unrealized_pnl_matches_formula() {
        let pos = Position::new_long(order(dec!(10), dec!(2), OrderSide::Buy));
        assert_eq!(pos.unrealized_pnl(dec!(12)), dec!(4));
        assert_eq!(pos.unrealized_pnl_percent(dec!(12)), dec!(20));
    }

    #[test]
    fn realized_pnl_zero_while_open() {
        let pos = Position::new_long(order(dec!(10), dec!(2), OrderSide::Buy));
        assert_eq!(pos.realized_pnl(), Decimal::ZERO);
    }

    #[test]
    fn realized_pnl_after_close() {
        let mut pos = Position::new_long(order(dec!(10), dec!(2), OrderSide::Buy));
        pos.exit_order = Some(order(dec!(11), dec!(2), OrderSide::Sell));
        assert_eq!(pos.realized_pnl(), dec!(2));
        assert_eq!(pos.realized_pnl_percent(), dec!(10));
    }
}
