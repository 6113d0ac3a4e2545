//! The reference `DexAggregator` implementation: a Jupiter-shaped quote/swap
//! client. Grounded on the teacher's `trading::jupiter::JupiterClient`
//! (reqwest, `/quote` and `/swap`, camelCase wire structs), generalized to
//! take `slippage_bps` per call (the pipeline's retry policy varies it
//! across attempts, spec §4.3) instead of fixing it at construction.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::error::{EngineError, Result};

use super::{DexAggregator, QuoteRequest, QuoteResponse};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JupiterQuoteQuery<'a> {
    input_mint: &'a str,
    output_mint: &'a str,
    amount: u64,
    slippage_bps: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    only_direct_routes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_accounts: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct JupiterQuoteResponse {
    input_mint: String,
    in_amount: String,
    output_mint: String,
    out_amount: String,
    other_amount_threshold: String,
    slippage_bps: u16,
    price_impact_pct: String,
    route_plan: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JupiterSwapRequest {
    user_public_key: String,
    quote_response: JupiterQuoteResponse,
    wrap_and_unwrap_sol: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JupiterSwapResponse {
    swap_transaction: String,
}

/// Carries the raw Jupiter quote response alongside our typed view so
/// `get_swap_transaction` can replay it verbatim to `/swap`.
#[derive(Debug, Clone)]
struct RawQuote {
    response: JupiterQuoteResponse,
}

/// Jupiter-shaped aggregator client. The concrete wire format beyond this
/// reference shape is explicitly out of scope (spec §1); this is one
/// pluggable implementation of `DexAggregator`.
pub struct JupiterAggregator {
    http: reqwest::Client,
    base_url: String,
    raw_quotes: parking_lot::Mutex<std::collections::HashMap<(String, String, u64), RawQuote>>,
}

impl JupiterAggregator {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(5_000))
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(EngineError::Http)?;
        Ok(Self { http, base_url: base_url.into(), raw_quotes: parking_lot::Mutex::new(Default::default()) })
    }
}

#[async_trait]
impl DexAggregator for JupiterAggregator {
    async fn get_quote(&self, request: QuoteRequest) -> Result<QuoteResponse> {
        let url = format!("{}/quote", self.base_url);
        let query = JupiterQuoteQuery {
            input_mint: &request.input_mint,
            output_mint: &request.output_mint,
            amount: request.amount_in,
            slippage_bps: request.slippage_bps,
            only_direct_routes: request.only_direct_routes,
            max_accounts: request.max_accounts,
        };

        let response = self.http.get(&url).query(&query).send().await.map_err(EngineError::Http)?;
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EngineError::Rpc(format!("jupiter quote error: {text}")));
        }
        let raw: JupiterQuoteResponse = response.json().await.map_err(EngineError::Http)?;
        debug!(route_legs = raw.route_plan.len(), "fetched jupiter quote");

        if raw.route_plan.is_empty() {
            return Err(EngineError::NoRoute);
        }

        let in_amount: u64 = raw.in_amount.parse().map_err(|e| EngineError::Parse(format!("in_amount: {e}")))?;
        let out_amount: u64 = raw.out_amount.parse().map_err(|e| EngineError::Parse(format!("out_amount: {e}")))?;
        let threshold: u64 = raw
            .other_amount_threshold
            .parse()
            .map_err(|e| EngineError::Parse(format!("other_amount_threshold: {e}")))?;
        let price_impact_pct = raw
            .price_impact_pct
            .parse()
            .map_err(|e| EngineError::Parse(format!("price_impact_pct: {e}")))?;

        let key = (request.input_mint.clone(), request.output_mint.clone(), request.amount_in);
        self.raw_quotes.lock().insert(key, RawQuote { response: raw.clone() });

        Ok(QuoteResponse {
            input_mint: raw.input_mint,
            output_mint: raw.output_mint,
            in_amount,
            out_amount,
            other_amount_threshold: threshold,
            slippage_bps: raw.slippage_bps,
            price_impact_pct,
            route_plan: raw.route_plan,
        })
    }

    async fn get_swap_transaction(&self, quote: &QuoteResponse, user_pubkey: &Pubkey) -> Result<Vec<u8>> {
        let key = (quote.input_mint.clone(), quote.output_mint.clone(), quote.in_amount);
        let raw = self
            .raw_quotes
            .lock()
            .get(&key)
            .cloned()
            .ok_or_else(|| EngineError::Rpc("get_swap_transaction called without a matching prior quote".into()))?;

        let url = format!("{}/swap", self.base_url);
        let request = JupiterSwapRequest {
            user_public_key: user_pubkey.to_string(),
            quote_response: raw.response,
            wrap_and_unwrap_sol: true,
        };
        let response = self.http.post(&url).json(&request).send().await.map_err(EngineError::Http)?;
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EngineError::Rpc(format!("jupiter swap error: {text}")));
        }
        let swap: JupiterSwapResponse = response.json().await.map_err(EngineError::Http)?;
        STANDARD.decode(swap.swap_transaction).map_err(|e| EngineError::Decode(format!("swap tx base64: {e}")))
    }
}
