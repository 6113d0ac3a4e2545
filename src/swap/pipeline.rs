//! The six-step swap protocol and its pipeline-level retry policy (spec
//! §4.3). Quote -> build -> sign -> simulate -> submit -> confirm; on any
//! failure the whole sequence is retried up to 3 times with slippage bps
//! `[50, 50, 75]`. Resolves spec §9 Open Question (a): a confirmation
//! timeout re-polls `get_signature_statuses` for the prior signature before
//! a fresh `send`, rather than blindly resubmitting.

use std::sync::Arc;
use std::time::{Duration, Instant};

use solana_sdk::message::VersionedMessage;
use solana_sdk::transaction::VersionedTransaction;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RunMode;
use crate::error::{EngineError, Result};

use super::{ConfirmationStatus, DexAggregator, QuoteRequest, SolanaRpc, TransactionSigner};

/// Slippage bps tried across the 3 pipeline attempts (spec §4.3): the second
/// attempt repeats the first to cover transient route unavailability, the
/// third is more permissive.
const SLIPPAGE_SCHEDULE_BPS: [u16; 3] = [50, 50, 75];

const CONFIRM_POLL_INTERVAL: Duration = Duration::from_secs(1);
const CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);

/// The result of one successful swap: enough to let `Account` construct the
/// `Order` it records.
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    pub signature: String,
    pub in_amount_raw: u64,
    pub out_amount_raw: u64,
}

pub struct SwapPipeline {
    dex: Arc<dyn DexAggregator>,
    rpc: Arc<dyn SolanaRpc>,
    signer: Arc<dyn TransactionSigner>,
    run_mode: RunMode,
}

impl SwapPipeline {
    pub fn new(
        dex: Arc<dyn DexAggregator>,
        rpc: Arc<dyn SolanaRpc>,
        signer: Arc<dyn TransactionSigner>,
        run_mode: RunMode,
    ) -> Self {
        Self { dex, rpc, signer, run_mode }
    }

    pub fn wallet_pubkey(&self) -> solana_sdk::pubkey::Pubkey {
        self.signer.public_key()
    }

    pub fn rpc(&self) -> &Arc<dyn SolanaRpc> {
        &self.rpc
    }

    /// Runs the quote -> build -> sign -> simulate -> submit -> confirm
    /// protocol for `amount_in_raw` of `input_mint`, retrying the whole
    /// sequence up to 3 times on any failure (spec §4.3).
    pub async fn swap(&self, input_mint: &str, output_mint: &str, amount_in_raw: u64) -> Result<SwapOutcome> {
        let mut last_signature: Option<String> = None;
        let mut last_error: Option<EngineError> = None;

        for (attempt, slippage_bps) in SLIPPAGE_SCHEDULE_BPS.into_iter().enumerate() {
            if let Some(signature) = &last_signature {
                if let Some(outcome) = self.recover_confirmed(signature, amount_in_raw).await? {
                    info!(signature, "prior submission had already landed, short-circuiting retry");
                    return Ok(outcome);
                }
            }

            debug!(attempt, slippage_bps, "swap pipeline attempt");
            match self.attempt(input_mint, output_mint, amount_in_raw, slippage_bps).await {
                Ok((outcome, signature)) => {
                    let _ = signature;
                    return Ok(outcome);
                }
                Err((err, signature)) => {
                    warn!(attempt, error = %err, "swap attempt failed");
                    last_signature = signature.or(last_signature);
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or(EngineError::NoRoute))
    }

    /// Re-checks a signature from a prior attempt before resubmitting: if it
    /// already landed, the retry is a no-op success instead of a duplicate
    /// send.
    async fn recover_confirmed(&self, signature: &str, amount_in_raw: u64) -> Result<Option<SwapOutcome>> {
        let statuses = self.rpc.get_signature_statuses(std::slice::from_ref(&signature.to_string())).await?;
        let Some(Some(status)) = statuses.into_iter().next() else { return Ok(None) };
        if status.err.is_some() {
            return Ok(None);
        }
        match status.confirmation_status {
            Some(c) if c.is_landed() => {
                Ok(Some(SwapOutcome { signature: signature.to_string(), in_amount_raw: amount_in_raw, out_amount_raw: 0 }))
            }
            _ => Ok(None),
        }
    }

    async fn attempt(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount_in_raw: u64,
        slippage_bps: u16,
    ) -> std::result::Result<(SwapOutcome, Option<String>), (EngineError, Option<String>)> {
        // 1. Quote.
        let quote = self
            .dex
            .get_quote(QuoteRequest {
                input_mint: input_mint.to_string(),
                output_mint: output_mint.to_string(),
                amount_in: amount_in_raw,
                slippage_bps,
                only_direct_routes: None,
                max_accounts: None,
            })
            .await
            .map_err(|e| (e, None))?;

        // 2. Build transaction.
        let wallet_pubkey = self.signer.public_key();
        let tx_bytes = self.dex.get_swap_transaction(&quote, &wallet_pubkey).await.map_err(|e| (e, None))?;

        // 3. Sign: fetch fresh blockhash, rewrite the message, sign.
        let blockhash = self.rpc.get_latest_blockhash().await.map_err(|e| (e, None))?;
        let signed_tx = self.rebuild_and_sign(&tx_bytes, blockhash).map_err(|e| (e, None))?;

        // 4. Simulate.
        self.rpc.simulate_transaction(&signed_tx).await.map_err(|e| (e, None))?;

        // 5. Submit. Dry-run skips the broadcast and fabricates a unique
        // signature instead; every upstream step still ran (spec §1, §4.3
        // step 5).
        let signature = if self.run_mode.is_dry() {
            let signature = format!("dry-run-{}", Uuid::new_v4());
            info!(signature, "dry-run swap, skipping submit/confirm");
            signature
        } else {
            self.rpc.send_raw_transaction(&signed_tx).await.map_err(|e| (e, None))?
        };

        // 6. Confirm. Dry-run confirms immediately.
        if !self.run_mode.is_dry() {
            self.confirm(&signature).await.map_err(|e| (e, Some(signature.clone())))?;
        }

        Ok((
            SwapOutcome { signature, in_amount_raw: quote.in_amount, out_amount_raw: quote.out_amount },
            None,
        ))
    }

    fn rebuild_and_sign(&self, tx_bytes: &[u8], blockhash: solana_sdk::hash::Hash) -> Result<VersionedTransaction> {
        let mut tx: VersionedTransaction =
            bincode::deserialize(tx_bytes).map_err(|e| EngineError::Decode(format!("swap transaction: {e}")))?;

        match &mut tx.message {
            VersionedMessage::Legacy(message) => message.recent_blockhash = blockhash,
            VersionedMessage::V0(message) => message.recent_blockhash = blockhash,
        }

        let message_bytes = match &tx.message {
            VersionedMessage::Legacy(m) => m.serialize(),
            VersionedMessage::V0(m) => m.serialize(),
        };
        let signature = self.signer.sign(&message_bytes);
        tx.signatures = vec![signature];
        Ok(tx)
    }

    async fn confirm(&self, signature: &str) -> Result<()> {
        let deadline = Instant::now() + CONFIRM_TIMEOUT;
        loop {
            let statuses = self.rpc.get_signature_statuses(std::slice::from_ref(&signature.to_string())).await?;
            if let Some(Some(status)) = statuses.into_iter().next() {
                if let Some(err) = status.err {
                    return Err(EngineError::ExecutionFailed(err));
                }
                if matches!(status.confirmation_status, Some(c) if c.is_landed()) {
                    return Ok(());
                }
            }
            if Instant::now() >= deadline {
                return Err(EngineError::ConfirmationTimeout(CONFIRM_TIMEOUT));
            }
            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }
    }
}
