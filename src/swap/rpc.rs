//! RPC access (spec §6): blockhash, simulate, submit, confirmation polling,
//! account/balance reads. Typed calls go through
//! `solana_client::nonblocking::rpc_client::RpcClient` (mirrors the teacher's
//! `utils::token::get_token_balance`); `get_token_accounts_by_owner` decodes
//! the raw SPL token-account bytes per spec §6's glossary (mint at
//! `[0..32)`, little-endian u64 amount at `[64..72)`) rather than pulling in
//! a second typed-account crate for one struct.

use async_trait::async_trait;
use solana_account_decoder::UiAccountData;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::TokenAccountsFilter;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::VersionedTransaction;
use spl_token::ID as SPL_TOKEN_PROGRAM_ID;

use crate::error::{EngineError, Result};

use super::{ConfirmationStatus, RpcAccountInfo, SignatureStatus, SolanaRpc, TokenAccountEntry};

pub struct SolanaJsonRpcClient {
    inner: RpcClient,
}

impl SolanaJsonRpcClient {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self { inner: RpcClient::new(rpc_url.into()) }
    }
}

fn decode_token_account(data: &[u8]) -> Result<(Pubkey, u64)> {
    if data.len() < 72 {
        return Err(EngineError::Decode(format!("token account data too short: {} bytes", data.len())));
    }
    let mint = Pubkey::try_from(&data[0..32]).map_err(|e| EngineError::Decode(format!("token account mint: {e}")))?;
    let amount = u64::from_le_bytes(data[64..72].try_into().expect("slice is 8 bytes"));
    Ok((mint, amount))
}

#[async_trait]
impl SolanaRpc for SolanaJsonRpcClient {
    async fn get_latest_blockhash(&self) -> Result<Hash> {
        self.inner.get_latest_blockhash().await.map_err(|e| EngineError::Rpc(format!("get_latest_blockhash: {e}")))
    }

    async fn simulate_transaction(&self, tx: &VersionedTransaction) -> Result<()> {
        let response = self
            .inner
            .simulate_transaction(tx)
            .await
            .map_err(|e| EngineError::SimulationFailed(e.to_string()))?;
        match response.value.err {
            Some(err) => Err(EngineError::SimulationFailed(err.to_string())),
            None => Ok(()),
        }
    }

    async fn send_raw_transaction(&self, tx: &VersionedTransaction) -> Result<String> {
        self.inner
            .send_transaction(tx)
            .await
            .map(|sig| sig.to_string())
            .map_err(|e| EngineError::SubmitFailed(e.to_string()))
    }

    async fn get_signature_statuses(&self, signatures: &[String]) -> Result<Vec<Option<SignatureStatus>>> {
        let parsed: Vec<solana_sdk::signature::Signature> = signatures
            .iter()
            .map(|s| s.parse().map_err(|e| EngineError::Parse(format!("signature {s}: {e}"))))
            .collect::<Result<_>>()?;

        let response = self
            .inner
            .get_signature_statuses(&parsed)
            .await
            .map_err(|e| EngineError::Rpc(format!("get_signature_statuses: {e}")))?;

        Ok(response
            .value
            .into_iter()
            .map(|status| {
                status.map(|s| SignatureStatus {
                    confirmation_status: s.confirmation_status.map(|c| match c {
                        solana_transaction_status::TransactionConfirmationStatus::Processed => {
                            ConfirmationStatus::Processed
                        }
                        solana_transaction_status::TransactionConfirmationStatus::Confirmed => {
                            ConfirmationStatus::Confirmed
                        }
                        solana_transaction_status::TransactionConfirmationStatus::Finalized => {
                            ConfirmationStatus::Finalized
                        }
                    }),
                    err: s.err.map(|e| e.to_string()),
                })
            })
            .collect())
    }

    async fn get_account_info(&self, pubkey: &Pubkey) -> Result<Option<RpcAccountInfo>> {
        match self.inner.get_account(pubkey).await {
            Ok(account) => Ok(Some(RpcAccountInfo { lamports: account.lamports, owner: account.owner, data: account.data })),
            Err(_) => Ok(None),
        }
    }

    async fn get_token_accounts_by_owner(&self, owner: &Pubkey) -> Result<Vec<TokenAccountEntry>> {
        let accounts = self
            .inner
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::ProgramId(SPL_TOKEN_PROGRAM_ID))
            .await
            .map_err(|e| EngineError::Rpc(format!("get_token_accounts_by_owner: {e}")))?;

        let mut entries = Vec::with_capacity(accounts.len());
        for keyed in accounts {
            let pubkey: Pubkey =
                keyed.pubkey.parse().map_err(|e| EngineError::Parse(format!("token account pubkey: {e}")))?;
            let UiAccountData::Binary(base64_data, _encoding) = keyed.account.data else {
                // jsonParsed or legacy-binary encodings aren't requested by this
                // client; any mint we can't decode this way is silently
                // ignored, per spec §4.1 (stray tokens don't break balance reads).
                continue;
            };
            let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(base64_data) else { continue };
            let Ok((mint, amount)) = decode_token_account(&bytes) else { continue };
            entries.push(TokenAccountEntry { pubkey, mint, amount });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_token_account_reads_mint_and_amount() {
        let mut data = vec![0u8; 165];
        let mint = Pubkey::new_unique();
        data[0..32].copy_from_slice(mint.as_ref());
        data[64..72].copy_from_slice(&42u64.to_le_bytes());
        let (decoded_mint, amount) = decode_token_account(&data).unwrap();
        assert_eq!(decoded_mint, mint);
        assert_eq!(amount, 42);
    }

    #[test]
    fn decode_token_account_rejects_short_buffers() {
        assert!(decode_token_account(&[0u8; 10]).is_err());
    }
}
