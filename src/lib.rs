//! Autonomous spot-trading engine: a live-price/candle feed, a pluggable
//! strategy protocol, an account with position and balance invariants, and
//! a signed on-chain swap execution pipeline (quote -> build -> sign ->
//! simulate -> submit -> confirm), with dry-run and backtest modes.
//!
//! One engine instance trades exactly one (input_mint, output_mint) pair
//! and holds no state across restarts. CLI front-ends, secret/env loading,
//! report rendering, charting, and concrete notification transports are
//! external collaborators the binary embedding this crate is expected to
//! supply; see `EngineConfig` for the surface a front-end populates.

pub mod account;
pub mod analytics;
pub mod backtest;
pub mod config;
pub mod engine;
pub mod error;
pub mod market;
pub mod mint;
pub mod models;
pub mod notifier;
pub mod strategy;
pub mod swap;
pub mod utils;

pub use account::Account;
pub use backtest::{BacktestReport, BacktestRunner};
pub use config::{EngineConfig, RunMode, StrategyParams};
pub use engine::TradingEngine;
pub use error::{EngineError, Result};
pub use mint::{Mint, MintRegistry};
pub use models::{Interval, MintBalance, Order, OrderSide, OrderSignal, Position, PositionType, TickerData};
