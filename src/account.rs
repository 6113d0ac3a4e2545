//! C4: the account. Balance cache, position state machine, buy/sell gating,
//! PnL accounting (spec §4.4). Grounded on `original_source/trader/async_account.py`
//! (`can_buy`/`can_sell`/`buy`/`sell`/`get_total_realized_pnl`), generalized
//! to the concrete Solana swap pipeline instead of a centralized-exchange
//! REST client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::{EngineError, Result};
use crate::mint::MintRegistry;
use crate::models::{MintBalance, Order, OrderSide, Position};
use crate::swap::SwapPipeline;

const MIN_BUY_BALANCE_UI: &str = "0.01";
const MIN_SELL_BALANCE_UI: &str = "0.00001";

struct BalanceSnapshot {
    fetched_at: Instant,
    position_version_at_fetch: u64,
    balances: HashMap<String, Decimal>,
}

/// Owns the (input_mint, output_mint) pair's balance cache, open position,
/// and realized-PnL accumulator for one engine instance. One `Account` per
/// engine; never shared across engines (spec §1 Non-goals).
pub struct Account {
    input_mint: String,
    output_mint: String,
    registry: MintRegistry,
    pipeline: SwapPipeline,
    current_position: Option<Position>,
    total_realized_pnl: Decimal,
    /// Closed positions, bounded by process lifetime (no persistence, spec
    /// §1); useful for a report layer the spec explicitly keeps out of scope,
    /// kept here since the underlying data already exists.
    closed_positions: Vec<Position>,
    cache: ArcSwapOption<BalanceSnapshot>,
    cache_ttl: Duration,
    /// Bumped every time `current_position` transitions, so a cached balance
    /// snapshot fetched before the transition is known-stale (spec §4.4).
    position_version: AtomicU64,
}

impl Account {
    pub fn new(input_mint: impl Into<String>, output_mint: impl Into<String>, registry: MintRegistry, pipeline: SwapPipeline) -> Self {
        Self {
            input_mint: input_mint.into(),
            output_mint: output_mint.into(),
            registry,
            pipeline,
            current_position: None,
            total_realized_pnl: Decimal::ZERO,
            closed_positions: Vec::new(),
            cache: ArcSwapOption::empty(),
            cache_ttl: Duration::from_secs(180),
            position_version: AtomicU64::new(0),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn input_mint(&self) -> &str {
        &self.input_mint
    }

    pub fn output_mint(&self) -> &str {
        &self.output_mint
    }

    pub fn position(&self) -> Option<&Position> {
        self.current_position.as_ref()
    }

    pub fn total_realized_pnl(&self) -> Decimal {
        self.total_realized_pnl
    }

    pub fn closed_positions(&self) -> &[Position] {
        &self.closed_positions
    }

    pub fn unrealized_pnl(&self, current_price: Decimal) -> Decimal {
        self.current_position.as_ref().map(|p| p.unrealized_pnl(current_price)).unwrap_or(Decimal::ZERO)
    }

    fn cache_is_valid(&self, snapshot: &BalanceSnapshot) -> bool {
        snapshot.fetched_at.elapsed() < self.cache_ttl
            && snapshot.position_version_at_fetch == self.position_version.load(Ordering::SeqCst)
    }

    async fn snapshot(&self) -> Result<std::sync::Arc<BalanceSnapshot>> {
        if let Some(existing) = self.cache.load_full() {
            if self.cache_is_valid(&existing) {
                return Ok(existing);
            }
        }

        let wallet = self.pipeline.wallet_pubkey();
        let entries = self.pipeline.rpc().get_token_accounts_by_owner(&wallet).await?;
        let mut balances = HashMap::new();
        for entry in entries {
            let Some(mint) = self.registry.get_pubkey(&entry.mint) else {
                // Unknown mints are silently ignored (spec §4.1).
                continue;
            };
            balances.insert(mint.address.clone(), mint.raw_to_ui(entry.amount));
        }

        let snapshot = std::sync::Arc::new(BalanceSnapshot {
            fetched_at: Instant::now(),
            position_version_at_fetch: self.position_version.load(Ordering::SeqCst),
            balances,
        });
        self.cache.store(Some(snapshot.clone()));
        Ok(snapshot)
    }

    /// Refreshes the whole snapshot if the cache is stale or the position
    /// changed since it was taken, then returns the one mint's balance
    /// (spec §4.4).
    pub async fn get_balance(&self, mint: &str) -> Result<Decimal> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot.balances.get(mint).copied().unwrap_or(Decimal::ZERO))
    }

    pub async fn get_balance_record(&self, mint: &str) -> Result<MintBalance> {
        Ok(MintBalance { mint: mint.to_string(), available: self.get_balance(mint).await? })
    }

    pub async fn can_buy(&self) -> Result<bool> {
        if self.current_position.is_some() {
            return Ok(false);
        }
        let min: Decimal = MIN_BUY_BALANCE_UI.parse().expect("constant parses");
        Ok(self.get_balance(&self.input_mint).await? >= min)
    }

    pub async fn can_sell(&self) -> Result<bool> {
        if self.current_position.is_none() {
            return Ok(false);
        }
        let min: Decimal = MIN_SELL_BALANCE_UI.parse().expect("constant parses");
        Ok(self.get_balance(&self.output_mint).await? >= min)
    }

    fn bump_position_version(&self) {
        self.position_version.fetch_add(1, Ordering::SeqCst);
    }

    /// Places an order for `quantity` units (output-token/"coin" units,
    /// consistently for both buy and sell, matching
    /// `original_source/trader/async_account.py`'s PnL accounting; see
    /// DESIGN.md for how this resolves spec §3's ambiguous wording) at
    /// `price`. Dispatches to `buy`/`sell` per `side` (spec §4.4).
    pub async fn place_order(&mut self, price: Decimal, side: OrderSide, quantity: Decimal) -> Result<Order> {
        self.place_order_at(Utc::now(), price, side, quantity).await
    }

    /// As `place_order`, but with an explicit order timestamp instead of
    /// wall-clock `now()`. `BacktestRunner` uses this to stamp synthesized
    /// orders with the replayed candle's own timestamp, keeping a backtest's
    /// PnL series internally consistent with its time axis (spec
    /// supplement, see SPEC_FULL.md §4.7).
    pub async fn place_order_at(
        &mut self,
        timestamp: chrono::DateTime<Utc>,
        price: Decimal,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<Order> {
        match side {
            OrderSide::Buy => self.buy(timestamp, price, quantity).await,
            OrderSide::Sell => self.sell(timestamp, price, quantity).await,
        }
    }

    async fn buy(&mut self, timestamp: chrono::DateTime<Utc>, price: Decimal, quantity: Decimal) -> Result<Order> {
        if !self.can_buy().await? {
            return Err(EngineError::PositionStateError("cannot buy: position already open or balance too low".into()));
        }

        let amount_in_ui = quantity * price;
        let amount_in_raw = self
            .registry
            .ui_to_raw(&self.input_mint, amount_in_ui)?;

        let outcome = self.pipeline.swap(&self.input_mint, &self.output_mint, amount_in_raw).await?;

        let order = Order {
            order_id: outcome.signature,
            input_mint: self.input_mint.clone(),
            output_mint: self.output_mint.clone(),
            quantity,
            price,
            side: OrderSide::Buy,
            timestamp,
        };
        self.current_position = Some(Position::new_long(order.clone()));
        self.bump_position_version();
        info!(mint = %self.output_mint, quantity = %quantity, price = %price, "position opened");
        Ok(order)
    }

    async fn sell(&mut self, timestamp: chrono::DateTime<Utc>, price: Decimal, quantity: Decimal) -> Result<Order> {
        if !self.can_sell().await? {
            return Err(EngineError::PositionStateError("cannot sell: no open position or balance too low".into()));
        }

        let amount_out_raw = self.registry.ui_to_raw(&self.output_mint, quantity)?;
        let outcome = self.pipeline.swap(&self.output_mint, &self.input_mint, amount_out_raw).await?;

        let order = Order {
            order_id: outcome.signature,
            input_mint: self.input_mint.clone(),
            output_mint: self.output_mint.clone(),
            quantity,
            price,
            side: OrderSide::Sell,
            timestamp,
        };

        let mut position = self.current_position.take().ok_or_else(|| {
            EngineError::PositionStateError("position vanished between gate check and sell".into())
        })?;
        position.exit_order = Some(order.clone());
        self.total_realized_pnl += position.realized_pnl();
        info!(
            mint = %self.output_mint,
            quantity = %quantity,
            price = %price,
            realized_pnl = %position.realized_pnl(),
            "position closed"
        );
        self.closed_positions.push(position);
        self.bump_position_version();
        Ok(order)
    }
}
