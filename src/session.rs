//! Per-session encryption state for the signed-in user.
//!
//! The keypair is owned by the caller's [`ChatSession`] and dropped with it.
//! Nothing is cached globally; a new session re-derives from a fresh
//! wallet signature.

use tracing::{debug, info};

use crate::keys::{derive_keypair, Keypair};
use crate::room::{DecryptOutcome, RoomEncryption, RoomKey, RoomKeyManager};
use crate::types::{Result, SIGN_MESSAGE};
use crate::wallet::Wallet;

/// The signed-in user's address and derived encryption keys.
#[derive(Debug)]
pub struct ChatSession {
    /// The user's Sui address.
    address: String,
    /// The user's X25519 encryption keypair.
    keypair: Keypair,
}

impl ChatSession {
    /// Establishes a session by asking the wallet to sign [`SIGN_MESSAGE`].
    pub async fn establish<W: Wallet + ?Sized>(wallet: &W) -> Result<Self> {
        let address = wallet.address().to_string();
        debug!(%address, "requesting key-derivation signature");

        let signature = wallet.sign_personal_message(SIGN_MESSAGE.as_bytes()).await?;
        let session = Self::from_signature(address, &signature);

        info!(address = %session.address, "encryption keypair derived");
        Ok(session)
    }

    /// Creates a session from an already obtained signature.
    pub fn from_signature(address: impl Into<String>, signature: &[u8]) -> Self {
        Self {
            address: address.into(),
            keypair: derive_keypair(signature),
        }
    }

    /// Returns the user's Sui address.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// Public key to publish on the user's profile.
    pub fn public_key_base64(&self) -> String {
        self.keypair.public_key_base64()
    }

    /// Opens our sealed copy of a room key.
    pub fn unseal_room_key(&self, encrypted_key: &str) -> Option<RoomKey> {
        RoomKeyManager::new().unseal_own_copy_base64(encrypted_key, self.keypair.secret_key())
    }

    /// Resolves the room's encryption mode for this member.
    ///
    /// `encrypted_key` is our sealed copy for a private room, or `None` for a
    /// public room. Returns `None` if a copy is present but cannot be opened.
    pub fn room_encryption(&self, encrypted_key: Option<&str>) -> Option<RoomEncryption> {
        match encrypted_key {
            None => Some(RoomEncryption::Public),
            Some(encoded) => self.unseal_room_key(encoded).map(RoomEncryption::Private),
        }
    }

    /// Opens a message body from a room given our sealed key copy.
    pub fn read_message(&self, encrypted_key: Option<&str>, body: &str) -> DecryptOutcome {
        match self.room_encryption(encrypted_key) {
            Some(room) => room.decrypt(body),
            None => DecryptOutcome::DecryptionFailed,
        }
    }
}
