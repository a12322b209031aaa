//! Wallet interfaces.
//!
//! The wallet (browser extension, zkLogin signer, hardware device) lives
//! outside this crate. Implementations can use any Sui SDK.

use crate::types::Result;

/// Trait for the identity provider that owns the user's Sui account.
#[async_trait::async_trait]
pub trait Wallet: Send + Sync {
    /// The session account address (`0x`-prefixed hex).
    fn address(&self) -> &str;

    /// Sign an arbitrary message and return the raw signature bytes.
    ///
    /// Signing the same message must produce the same bytes; encryption
    /// keys are re-derived from this output.
    async fn sign_personal_message(&self, message: &[u8]) -> Result<Vec<u8>>;
}

/// Trait for signing fully assembled transaction bytes.
#[async_trait::async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Sign BCS-encoded transaction data and return the serialized
    /// signature in the base64 form the network expects.
    async fn sign_transaction(&self, transaction_bytes: &[u8]) -> Result<String>;
}
