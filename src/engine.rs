//! C6: the top-level trading loop (spec §4.6). Pulls a price, evaluates the
//! strategy against the current account snapshot, dispatches an order on a
//! signal, and logs — forever, until an external interrupt or (if
//! `stop_on_error` is set) an unhandled tick error. Grounded on the
//! teacher's `trading::engine::TradingEngine`, generalized from "one
//! mpsc-fed trade executor spawned per copy-traded swap" to "one
//! cooperative loop per (input_mint, output_mint) pair" per spec §1/§5.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::account::Account;
use crate::analytics::EngineStats;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::market::MarketDataSource;
use crate::models::Interval;
use crate::notifier::Notifier;
use crate::strategy::{BoxedStrategy, Strategy};

/// Ties together the market data source, strategy, and account for one
/// (input_mint, output_mint) pair. One engine instance, one trading loop
/// (spec §1 Non-goals: no multi-pair, no persistence across restarts).
pub struct TradingEngine {
    config: EngineConfig,
    market: Box<dyn MarketDataSource>,
    strategy: BoxedStrategy,
    account: Account,
    notifier: Arc<dyn Notifier>,
    stats: EngineStats,
}

impl TradingEngine {
    pub fn new(
        config: EngineConfig,
        market: Box<dyn MarketDataSource>,
        strategy: BoxedStrategy,
        account: Account,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { config, market, strategy, account, notifier, stats: EngineStats::new() }
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Warms up the strategy with recent candles for the output mint (spec
    /// §4.6's `setup`). Called once before `run`/`run_until`.
    async fn warm_up(&mut self) -> Result<()> {
        let candles = self.market.get_candles(&self.config.output_mint, Interval::OneMinute, 200).await?;
        self.strategy.setup(&candles);
        Ok(())
    }

    /// Runs indefinitely until `should_stop` reports true at the top of a
    /// tick (the next price fetch is the only interruption point; a swap
    /// already in flight always runs to completion, per spec §5). Returns
    /// `Ok(())` on a clean stop.
    pub async fn run_until(&mut self, mut should_stop: impl FnMut() -> bool) -> Result<()> {
        self.warm_up().await?;

        loop {
            if should_stop() {
                info!("interrupt observed, stopping trading loop");
                return Ok(());
            }

            if let Err(err) = self.tick().await {
                self.stats.inc_failed();
                error!(error = %err, "tick failed");
                self.notifier.notify(&format!("tick error: {err}")).await;
                if self.config.stop_on_error {
                    return Err(err);
                }
            }
        }
    }

    /// Runs one full iteration of the loop body (spec §4.6): price fetch,
    /// strategy evaluation, optional order dispatch, logging. Exposed
    /// separately from `run_until` so tests can drive individual ticks.
    pub async fn tick(&mut self) -> Result<()> {
        let ticker = self.market.get_price(&self.config.output_mint).await?;
        debug!(pair = %ticker.pair, last = %ticker.last, "tick");
        self.stats.inc_tick();

        let balance = self.account.get_balance(self.account.input_mint()).await.ok();
        let position = self.account.position().cloned();

        let signal = self.strategy.on_market_refresh(&ticker, balance, position.as_ref());

        if let Some(signal) = signal {
            let quantity = match signal.quantity {
                Some(q) => q,
                None => self.strategy.calculate_quantity(balance.unwrap_or(Decimal::ZERO), ticker.last),
            };

            match self.account.place_order(ticker.last, signal.side, quantity).await {
                Ok(order) => {
                    info!(side = ?order.side, quantity = %order.quantity, price = %order.price, order_id = %order.order_id, "order placed");
                    match order.side {
                        crate::models::OrderSide::Buy => self.stats.inc_buy(),
                        crate::models::OrderSide::Sell => self.stats.inc_sell(),
                    }
                    self.notifier.notify(&format!("{:?} {} @ {}", order.side, order.quantity, order.price)).await;
                    tokio::time::sleep(self.config.post_order_settle).await;
                }
                Err(err) => {
                    // A rejected order (illegal state transition, failed swap)
                    // does not update position state; the loop continues
                    // without treating this as fatal (spec §7).
                    warn!(error = %err, "order placement failed");
                    return Err(err);
                }
            }
        }

        if let Some(position) = self.account.position() {
            debug!(unrealized_pnl = %position.unrealized_pnl(ticker.last), "position open");
        }

        Ok(())
    }
}
