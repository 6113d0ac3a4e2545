use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::error::{EngineError, Result};
use crate::models::{Interval, TickerData};

use super::MarketDataSource;

const RECONNECT_BACKOFF: Duration = Duration::from_secs(2);

/// The concrete wire format spoken over the streaming connection. This is
/// the "pluggable adapter" spec §1 calls out — the reconnect/backoff
/// engineering in `StreamingMarketDataSource` is independent of it.
pub trait WireFormat: Send + Sync + 'static {
    fn subscribe_message(&self, mint: &str) -> String;
    /// Returns `(mint, price)` if `text` is a price notification for any
    /// mint, `None` for anything else (heartbeats, acks, unrelated frames).
    fn parse_price(&self, text: &str) -> Option<(String, Decimal)>;
}

/// Default wire format: `{"mint": "...", "price": "..."}` JSON frames, one
/// subscription message per mint. Stands in for the aggregator's actual
/// streaming protocol, which is out of scope (spec §1).
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPriceWireFormat;

impl WireFormat for JsonPriceWireFormat {
    fn subscribe_message(&self, mint: &str) -> String {
        serde_json::json!({ "op": "subscribe", "mint": mint }).to_string()
    }

    fn parse_price(&self, text: &str) -> Option<(String, Decimal)> {
        let value: serde_json::Value = serde_json::from_str(text).ok()?;
        let mint = value.get("mint")?.as_str()?.to_string();
        let price_raw = value.get("price")?;
        let price = price_raw
            .as_str()
            .and_then(|s| s.parse::<Decimal>().ok())
            .or_else(|| price_raw.as_f64().and_then(|f| Decimal::try_from(f).ok()))?;
        Some((mint, price))
    }
}

/// Streaming price source backed by a WebSocket connection, plus an HTTP
/// candle endpoint. Reconnects transparently on transient loss with a fixed
/// 2s backoff and resubscribes to the same mint (spec §4.2).
pub struct StreamingMarketDataSource<W: WireFormat> {
    ws_url: String,
    candles_url: String,
    http: reqwest::Client,
    wire_format: W,
    rx: Option<mpsc::Receiver<TickerData>>,
    subscribed_mint: Option<String>,
}

impl<W: WireFormat> StreamingMarketDataSource<W> {
    pub fn new(ws_url: impl Into<String>, candles_url: impl Into<String>, wire_format: W) -> Self {
        Self {
            ws_url: ws_url.into(),
            candles_url: candles_url.into(),
            http: reqwest::Client::new(),
            wire_format,
            rx: None,
            subscribed_mint: None,
        }
    }

    fn ensure_subscribed(&mut self, mint: &str) {
        if self.rx.is_some() && self.subscribed_mint.as_deref() == Some(mint) {
            return;
        }
        let (tx, rx) = mpsc::channel(64);
        self.rx = Some(rx);
        self.subscribed_mint = Some(mint.to_string());
        spawn_reconnect_loop(self.ws_url.clone(), mint.to_string(), self.wire_format_clone(), tx);
    }

    fn wire_format_clone(&self) -> W
    where
        W: Clone,
    {
        self.wire_format.clone()
    }
}

fn spawn_reconnect_loop<W: WireFormat + Clone>(
    ws_url: String,
    mint: String,
    wire_format: W,
    tx: mpsc::Sender<TickerData>,
) {
    tokio::spawn(async move {
        loop {
            match run_connection(&ws_url, &mint, &wire_format, &tx).await {
                Ok(()) => warn!(mint = %mint, "price stream closed by peer, reconnecting"),
                Err(e) => error!(mint = %mint, error = %e, "price stream error, reconnecting"),
            }
            if tx.is_closed() {
                debug!(mint = %mint, "price stream receiver dropped, stopping reconnect loop");
                return;
            }
            tokio::time::sleep(RECONNECT_BACKOFF).await;
        }
    });
}

async fn run_connection<W: WireFormat>(
    ws_url: &str,
    mint: &str,
    wire_format: &W,
    tx: &mpsc::Sender<TickerData>,
) -> Result<()> {
    let (ws_stream, _) = connect_async(ws_url)
        .await
        .map_err(|e| EngineError::Rpc(format!("websocket connect failed: {e}")))?;
    info!(mint = %mint, "price stream connected");
    let (mut write, mut read) = ws_stream.split();

    write
        .send(Message::Text(wire_format.subscribe_message(mint)))
        .await
        .map_err(|e| EngineError::Rpc(format!("subscribe failed: {e}")))?;

    while let Some(msg) = read.next().await {
        let msg = msg.map_err(|e| EngineError::Rpc(format!("websocket stream error: {e}")))?;
        let Message::Text(text) = msg else { continue };
        if let Some((got_mint, price)) = wire_format.parse_price(&text) {
            if got_mint != mint {
                continue;
            }
            let ticker = TickerData::from_price(mint, Utc::now(), price);
            if tx.send(ticker).await.is_err() {
                return Ok(());
            }
        }
    }
    Ok(())
}

#[async_trait]
impl<W: WireFormat + Clone> MarketDataSource for StreamingMarketDataSource<W> {
    async fn get_candles(&self, mint: &str, interval: Interval, count: usize) -> Result<Vec<TickerData>> {
        let url = format!("{}/candles", self.candles_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("mint", mint),
                ("interval", &interval.as_seconds().to_string()),
                ("count", &count.to_string()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EngineError::Rpc(format!("candles request failed: {text}")));
        }
        let raw: Vec<RawCandle> = response.json().await.map_err(EngineError::Http)?;
        raw.into_iter().map(|c| c.into_ticker(mint)).collect()
    }

    async fn get_price(&mut self, mint: &str) -> Result<TickerData> {
        self.ensure_subscribed(mint);
        let rx = self.rx.as_mut().expect("subscribed above");
        rx.recv().await.ok_or(EngineError::StreamClosed)
    }
}

#[derive(serde::Deserialize)]
struct RawCandle {
    timestamp: i64,
    open: String,
    high: String,
    low: String,
    close: String,
    volume: String,
}

impl RawCandle {
    fn into_ticker(self, pair: &str) -> Result<TickerData> {
        let parse = |s: &str| s.parse::<Decimal>().map_err(|e| EngineError::Parse(format!("candle field {s}: {e}")));
        Ok(TickerData {
            pair: pair.to_string(),
            timestamp: chrono::DateTime::from_timestamp(self.timestamp, 0).unwrap_or_else(Utc::now),
            open: parse(&self.open)?,
            high: parse(&self.high)?,
            low: parse(&self.low)?,
            last: parse(&self.close)?,
            buy: parse(&self.close)?,
            sell: parse(&self.close)?,
            vol: parse(&self.volume)?,
            spread: None,
        })
    }
}
