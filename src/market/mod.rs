//! C2: the market data source. Exposes a streaming latest-price observation
//! and a pullable, finite candle history for one mint.

mod replay;
mod stream;

pub use replay::ReplayMarketDataSource;
pub use stream::{StreamingMarketDataSource, WireFormat};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Interval, TickerData};

/// A pluggable price/candle source for one mint, against a quote currency
/// implicit in the source's construction (e.g. USDC for a Jupiter-backed
/// source quoting in USDC).
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Finite, newest-last sequence of exactly `count` candles ending "now",
    /// used to warm up a strategy.
    async fn get_candles(&self, mint: &str, interval: Interval, count: usize) -> Result<Vec<TickerData>>;

    /// Suspends until the next fresh price observation for `mint` is
    /// available. Backed by a streaming connection that reconnects
    /// transparently on transient loss.
    async fn get_price(&mut self, mint: &str) -> Result<TickerData>;
}
