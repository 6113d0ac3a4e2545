//! Ambient observability counters for one engine instance. Grounded on the
//! teacher's `analytics::stats::Stats` (atomics, periodic `log_stats`).

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

#[derive(Debug, Default)]
pub struct EngineStats {
    pub ticks_processed: AtomicU64,
    pub buys_placed: AtomicU64,
    pub sells_placed: AtomicU64,
    pub orders_failed: AtomicU64,
    pub last_tick_latency_ms: AtomicU64,
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_tick(&self) {
        self.ticks_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_buy(&self) {
        self.buys_placed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_sell(&self) {
        self.sells_placed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed(&self) {
        self.orders_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick_latency_ms(&self, ms: u64) {
        self.last_tick_latency_ms.store(ms, Ordering::Relaxed);
    }

    pub fn log(&self) {
        info!(
            ticks = self.ticks_processed.load(Ordering::Relaxed),
            buys = self.buys_placed.load(Ordering::Relaxed),
            sells = self.sells_placed.load(Ordering::Relaxed),
            failed = self.orders_failed.load(Ordering::Relaxed),
            last_latency_ms = self.last_tick_latency_ms.load(Ordering::Relaxed),
            "engine stats"
        );
    }
}
