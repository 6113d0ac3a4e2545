//! Notifier interface (spec §6). A single `notify` operation; concrete chat
//! transports (Telegram et al.) are an external collaborator and are not
//! implemented here — only the two dependency-free implementations.

use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str);
}

/// Discards every message. Used by backtests and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, _message: &str) {}
}

/// Routes messages through `tracing` at `info!`. The default for a real run
/// that has not wired up an external transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) {
        info!(target: "notifier", "{message}");
    }
}
