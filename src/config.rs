//! Ambient configuration layer. `EngineConfig` is a validated, plain struct
//! a CLI front-end (out of scope per spec §1) would populate from flags or
//! secrets and hand to `TradingEngine::new` — the core never reads
//! `std::env` itself.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::error::{EngineError, Result};

/// Whether the pipeline broadcasts real transactions or fabricates a
/// signature and skips `send`/confirm network calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Real,
    Dry,
}

impl RunMode {
    pub fn is_dry(self) -> bool {
        matches!(self, RunMode::Dry)
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub input_mint: String,
    pub output_mint: String,
    pub run_mode: RunMode,
    /// Initial slippage in bps; the pipeline's own retry policy escalates
    /// this per-attempt, this is only the starting value.
    pub slippage_bps: u16,
    /// How long to wait between confirmation polls.
    pub confirm_poll_interval: Duration,
    /// Hard ceiling on total confirmation wait.
    pub confirm_timeout: Duration,
    /// Delay after a successful order before the next balance read, to let
    /// the RPC's view of the wallet settle.
    pub post_order_settle: Duration,
    /// Balance cache time-to-live.
    pub balance_cache_ttl: Duration,
    /// If set, the trading loop aborts on the first tick error instead of
    /// logging and continuing (spec §4.6/§7 default: continue).
    pub stop_on_error: bool,
}

impl EngineConfig {
    pub fn new(input_mint: impl Into<String>, output_mint: impl Into<String>, run_mode: RunMode) -> Result<Self> {
        let config = Self {
            input_mint: input_mint.into(),
            output_mint: output_mint.into(),
            run_mode,
            slippage_bps: 50,
            confirm_poll_interval: Duration::from_secs(1),
            confirm_timeout: Duration::from_secs(30),
            post_order_settle: Duration::from_secs(2),
            balance_cache_ttl: Duration::from_secs(180),
            stop_on_error: false,
        };
        config.validate()
    }

    pub fn with_slippage_bps(mut self, bps: u16) -> Result<Self> {
        self.slippage_bps = bps;
        self.validate()
    }

    pub fn with_stop_on_error(mut self, stop_on_error: bool) -> Result<Self> {
        self.stop_on_error = stop_on_error;
        self.validate()
    }

    pub fn with_post_order_settle(mut self, settle: Duration) -> Result<Self> {
        self.post_order_settle = settle;
        self.validate()
    }

    fn validate(self) -> Result<Self> {
        if self.input_mint.is_empty() || self.output_mint.is_empty() {
            return Err(EngineError::Config("input_mint/output_mint must not be empty".into()));
        }
        if self.input_mint == self.output_mint {
            return Err(EngineError::Config("input_mint and output_mint must differ".into()));
        }
        if self.slippage_bps == 0 || self.slippage_bps > 10_000 {
            return Err(EngineError::Config(format!("slippage_bps out of range: {}", self.slippage_bps)));
        }
        if self.confirm_timeout.is_zero() {
            return Err(EngineError::Config("confirm_timeout must be nonzero".into()));
        }
        Ok(self)
    }
}

/// Strategy selection's key=value parameters (spec §6), typed on read.
#[derive(Debug, Clone, Default)]
pub struct StrategyParams(HashMap<String, String>);

impl StrategyParams {
    pub fn new(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self(pairs.into_iter().collect())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.as_str())
    }

    pub fn decimal(&self, key: &str, default: Decimal) -> Result<Decimal> {
        match self.0.get(key) {
            None => Ok(default),
            Some(raw) => Decimal::from_str(raw)
                .map_err(|e| EngineError::Config(format!("param {key}={raw} is not a decimal: {e}"))),
        }
    }

    pub fn u32(&self, key: &str, default: u32) -> Result<u32> {
        match self.0.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|e| EngineError::Config(format!("param {key}={raw} is not a u32: {e}"))),
        }
    }

    pub fn boolean(&self, key: &str, default: bool) -> Result<bool> {
        match self.0.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|e| EngineError::Config(format!("param {key}={raw} is not a bool: {e}"))),
        }
    }
}
