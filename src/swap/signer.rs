//! Ed25519 signing over Solana-style versioned transactions. Grounded on the
//! teacher's `trading::signer::TransactionSigner`, generalized behind the
//! `TransactionSigner` trait so the pipeline can be driven by a fake in
//! tests.

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer as SolanaSigner};

use crate::error::{EngineError, Result};

use super::TransactionSigner;

/// Wraps a `solana_sdk::Keypair` loaded from a base58-encoded secret key.
/// Owned by the swap pipeline for the engine's lifetime and never shared
/// externally (spec §5).
pub struct Ed25519Signer {
    keypair: Keypair,
}

impl Ed25519Signer {
    pub fn from_base58_secret(private_key_base58: &str) -> Result<Self> {
        let bytes = bs58::decode(private_key_base58)
            .into_vec()
            .map_err(|e| EngineError::Config(format!("invalid wallet secret encoding: {e}")))?;
        let keypair = Keypair::from_bytes(&bytes)
            .map_err(|e| EngineError::Config(format!("invalid wallet keypair bytes: {e}")))?;
        Ok(Self { keypair })
    }
}

impl TransactionSigner for Ed25519Signer {
    fn public_key(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    fn sign(&self, message_bytes: &[u8]) -> Signature {
        self.keypair.sign_message(message_bytes)
    }
}
