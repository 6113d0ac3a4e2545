use async_trait::async_trait;

use crate::error::{EngineError, Result};
use crate::models::{Interval, TickerData};

use super::MarketDataSource;

/// Finite pre-loaded candle source that replays a fixed history one tick at
/// a time, used by `BacktestRunner` and by tests that want a deterministic
/// `MarketDataSource` without a network.
///
/// `get_candles` always returns the same warm-up window (the first `count`
/// candles); `get_price` advances a cursor through the remaining candles in
/// order and never reconnects — exhausting the history is terminal.
pub struct ReplayMarketDataSource {
    mint: String,
    candles: Vec<TickerData>,
    cursor: usize,
}

impl ReplayMarketDataSource {
    pub fn new(mint: impl Into<String>, candles: Vec<TickerData>) -> Self {
        Self { mint: mint.into(), candles, cursor: 0 }
    }

    /// Number of candles not yet consumed by `get_price`.
    pub fn remaining(&self) -> usize {
        self.candles.len().saturating_sub(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

#[async_trait]
impl MarketDataSource for ReplayMarketDataSource {
    async fn get_candles(&self, mint: &str, _interval: Interval, count: usize) -> Result<Vec<TickerData>> {
        if mint != self.mint {
            return Err(EngineError::UnknownMint(mint.to_string()));
        }
        let take = count.min(self.candles.len());
        Ok(self.candles[..take].to_vec())
    }

    async fn get_price(&mut self, mint: &str) -> Result<TickerData> {
        if mint != self.mint {
            return Err(EngineError::UnknownMint(mint.to_string()));
        }
        let candle = self.candles.get(self.cursor).cloned().ok_or(EngineError::StreamClosed)?;
        self.cursor += 1;
        Ok(candle)
    }
}
