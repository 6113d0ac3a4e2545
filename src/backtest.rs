//! Backtest mode (spec §1; component shape supplemented from
//! `original_source/trader/bot/backtest_bot.py` and
//! `trader/backtesting_bot.py` — see SPEC_FULL.md §4.7). Drives the same
//! strategy/account tick logic as `TradingEngine` over a finite,
//! already-fetched candle sequence instead of the live streaming
//! suspension point: no sleeps, no network calls, and the account's swap
//! pipeline is always forced into dry-run.

use rust_decimal::Decimal;

use crate::account::Account;
use crate::error::Result;
use crate::market::{MarketDataSource, ReplayMarketDataSource};
use crate::models::Position;
use crate::strategy::{BoxedStrategy, Strategy};

/// The data a report/chart layer would need, without rendering anything
/// itself (report rendering and charting stay out of scope, spec §1).
#[derive(Debug, Clone)]
pub struct BacktestReport {
    pub final_realized_pnl: Decimal,
    pub closed_positions: Vec<Position>,
    pub ticks_processed: u64,
}

/// Replays a fixed candle history through a strategy and account, warming
/// up on the first `warmup_count` candles and then feeding the remainder
/// one at a time through `on_market_refresh`/`place_order` exactly as
/// `TradingEngine::tick` does, minus the network suspension points.
pub struct BacktestRunner {
    market: ReplayMarketDataSource,
    strategy: BoxedStrategy,
    account: Account,
    warmup_count: usize,
}

impl BacktestRunner {
    /// `account`'s swap pipeline MUST already be constructed in dry-run mode
    /// (spec §4.7: a backtest never broadcasts); this is a caller
    /// obligation rather than something `BacktestRunner` can enforce
    /// without owning pipeline construction itself.
    pub fn new(market: ReplayMarketDataSource, strategy: BoxedStrategy, account: Account, warmup_count: usize) -> Self {
        Self { market, strategy, account, warmup_count }
    }

    /// Runs to exhaustion of the replayed candle sequence.
    pub async fn run(mut self) -> Result<BacktestReport> {
        let output_mint = self.account.output_mint().to_string();
        let input_mint = self.account.input_mint().to_string();

        let warmup = self
            .market
            .get_candles(&output_mint, crate::models::Interval::OneMinute, self.warmup_count)
            .await?;
        self.strategy.setup(&warmup);

        let mut ticks_processed: u64 = 0;
        loop {
            let ticker = match self.market.get_price(&output_mint).await {
                Ok(ticker) => ticker,
                Err(_) => break, // replay exhausted: a backtest ends, it doesn't reconnect.
            };
            ticks_processed += 1;

            let balance = self.account.get_balance(&input_mint).await.ok();
            let position = self.account.position().cloned();
            let signal = self.strategy.on_market_refresh(&ticker, balance, position.as_ref());

            if let Some(signal) = signal {
                let quantity = match signal.quantity {
                    Some(q) => q,
                    None => self.strategy.calculate_quantity(balance.unwrap_or(Decimal::ZERO), ticker.last),
                };
                // A rejected order (illegal transition, e.g. a double-buy
                // signal from an over-eager strategy) is swallowed here: a
                // backtest keeps replaying rather than aborting the run,
                // matching the live loop's "log and continue" policy (spec §7).
                // The order is stamped with the candle's own timestamp, not
                // wall-clock `now()`, so the PnL series stays consistent
                // with the replayed time axis.
                let _ = self
                    .account
                    .place_order_at(ticker.timestamp, ticker.last, signal.side, quantity)
                    .await;
            }
        }

        Ok(BacktestReport {
            final_realized_pnl: self.account.total_realized_pnl(),
            closed_positions: self.account.closed_positions().to_vec(),
            ticks_processed,
        })
    }
}
