//! Key derivation and management for Sui Chat.

use std::fmt;

use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{PublicKey, SharedSecret, StaticSecret};

use crate::encoding::{from_base64, to_base64};
use crate::types::{Result, SuiChatError, KEY_DERIVATION_INFO, KEY_DERIVATION_SALT, KEY_SIZE};

/// X25519 encryption keypair derived from a wallet signature.
///
/// The secret half is zeroized on drop.
#[derive(Clone)]
pub struct Keypair {
    secret: StaticSecret,
    public: PublicKey,
}

impl Keypair {
    /// Rebuilds a keypair from raw secret key bytes.
    pub fn from_secret_bytes(secret_key: [u8; KEY_SIZE]) -> Self {
        let secret = StaticSecret::from(secret_key);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// The X25519 public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// The X25519 secret key.
    pub fn secret_key(&self) -> &StaticSecret {
        &self.secret
    }

    pub fn public_key_bytes(&self) -> [u8; KEY_SIZE] {
        *self.public.as_bytes()
    }

    pub fn secret_key_bytes(&self) -> [u8; KEY_SIZE] {
        self.secret.to_bytes()
    }

    /// Public key as published on the user's profile.
    pub fn public_key_base64(&self) -> String {
        to_base64(self.public.as_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public", &hex::encode(self.public.as_bytes()))
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Derive an X25519 keypair from a wallet signature using HKDF-SHA256.
///
/// The signature is the wallet's output over [`SIGN_MESSAGE`](crate::SIGN_MESSAGE);
/// re-signing the same message reproduces the same keypair.
pub fn derive_keypair(signature: &[u8]) -> Keypair {
    let hkdf = Hkdf::<Sha256>::new(Some(KEY_DERIVATION_SALT), signature);
    let mut derived_key = [0u8; KEY_SIZE];
    hkdf.expand(KEY_DERIVATION_INFO, &mut derived_key)
        .expect("32 bytes is a valid length for HKDF-SHA256");

    Keypair::from_secret_bytes(derived_key)
}

/// Parse a 32-byte X25519 public key from raw bytes.
pub fn parse_public_key(bytes: &[u8]) -> Result<PublicKey> {
    let key: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
        SuiChatError::InvalidPublicKey(format!(
            "expected {} bytes, got {}",
            KEY_SIZE,
            bytes.len()
        ))
    })?;
    Ok(PublicKey::from(key))
}

/// Parse a base64-encoded public key read back from a profile.
pub fn parse_public_key_base64(encoded: &str) -> Result<PublicKey> {
    parse_public_key(&from_base64(encoded)?)
}

/// Generate a random ephemeral X25519 key pair.
///
/// # Returns
/// Tuple of (private_key, public_key)
pub fn generate_ephemeral_keypair() -> (StaticSecret, PublicKey) {
    let private_key = StaticSecret::random_from_rng(rand::rngs::OsRng);
    let public_key = PublicKey::from(&private_key);
    (private_key, public_key)
}

/// Perform X25519 ECDH key exchange.
pub fn x25519_ecdh(private_key: &StaticSecret, public_key: &PublicKey) -> SharedSecret {
    private_key.diffie_hellman(public_key)
}
