//! C1: the mint registry. A process-wide immutable table mapping a mint
//! identifier to its symbol and decimals, with UI<->raw conversion.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;

use crate::error::{EngineError, Result};

/// Identity of an on-chain token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mint {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Mint {
    pub fn pubkey(&self) -> Result<Pubkey> {
        Pubkey::from_str(&self.address)
            .map_err(|e| EngineError::Parse(format!("invalid mint pubkey {}: {e}", self.address)))
    }

    /// `raw = ui * 10^decimals`, truncated toward zero.
    pub fn ui_to_raw(&self, ui: Decimal) -> u64 {
        let scale = Decimal::from(10u64.pow(self.decimals as u32));
        let raw = (ui * scale).trunc();
        raw.try_into().unwrap_or(0)
    }

    pub fn raw_to_ui(&self, raw: u64) -> Decimal {
        let scale = Decimal::from(10u64.pow(self.decimals as u32));
        Decimal::from(raw) / scale
    }
}

/// Process-wide immutable table of known mints. Cheap to clone (an `Arc`
/// handle over the underlying maps) and safe to share across tasks without
/// synchronisation.
#[derive(Debug, Clone)]
pub struct MintRegistry {
    by_address: Arc<HashMap<String, Mint>>,
    by_symbol: Arc<HashMap<String, Mint>>,
}

impl MintRegistry {
    pub fn new(mints: Vec<Mint>) -> Self {
        let by_address = mints
            .iter()
            .cloned()
            .map(|m| (m.address.clone(), m))
            .collect();
        let by_symbol = mints.into_iter().map(|m| (m.symbol.clone(), m)).collect();
        Self { by_address: Arc::new(by_address), by_symbol: Arc::new(by_symbol) }
    }

    /// The seven mints exercised throughout the original trading system
    /// (`SOL`, `USDC`, `USDT`, `BONK`, `JUP`, `PUMP`, `TURBO`).
    pub fn solana_mainnet() -> Self {
        Self::new(vec![
            Mint { address: "So11111111111111111111111111111111111111112".into(), symbol: "SOL".into(), decimals: 9 },
            Mint { address: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".into(), symbol: "USDC".into(), decimals: 6 },
            Mint { address: "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB".into(), symbol: "USDT".into(), decimals: 6 },
            Mint { address: "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263".into(), symbol: "BONK".into(), decimals: 5 },
            Mint { address: "JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN".into(), symbol: "JUP".into(), decimals: 6 },
            Mint { address: "pumpCmXqMfrsAkQ5r49WcJnRayYRqmXz6ae8H7H9Dfn".into(), symbol: "PUMP".into(), decimals: 6 },
            Mint { address: "2Dyzu65QA9zdX1UeE7Gx71k7fiwyUK6sZdrvJ7auq5wm".into(), symbol: "TURBO".into(), decimals: 8 },
        ])
    }

    /// Accepts either the opaque base58 address or a typed `Pubkey` and
    /// canonicalises to the same lookup. Unknown mints return `None` so
    /// callers reading balances can silently ignore stray tokens.
    pub fn get(&self, mint: &str) -> Option<&Mint> {
        self.by_address.get(mint)
    }

    pub fn get_pubkey(&self, mint: &Pubkey) -> Option<&Mint> {
        self.by_address.get(&mint.to_string())
    }

    pub fn get_by_symbol(&self, symbol: &str) -> Option<&Mint> {
        self.by_symbol.get(symbol)
    }

    pub fn ui_to_raw(&self, mint: &str, ui: Decimal) -> Result<u64> {
        self.get(mint).map(|m| m.ui_to_raw(ui)).ok_or_else(|| EngineError::UnknownMint(mint.to_string()))
    }

    pub fn raw_to_ui(&self, mint: &str, raw: u64) -> Result<Decimal> {
        self.get(mint).map(|m| m.raw_to_ui(raw)).ok_or_else(|| EngineError::UnknownMint(mint.to_string()))
    }
}
