//! Anonymous public-key encryption ("sealed box") for distributing room keys.
//!
//! A fresh ephemeral X25519 key is generated per box. The AEAD key is derived
//! with HKDF-SHA256 over the ECDH output, salted with the ephemeral public key
//! and bound to both public keys through the info string. Each derived key
//! encrypts exactly one message, so a fixed nonce is used.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::keys::{generate_ephemeral_keypair, x25519_ecdh};
use crate::types::{Result, SuiChatError, KEY_SIZE, SEALED_BOX_INFO_PREFIX, SEALED_BOX_OVERHEAD};

const SEALED_BOX_NONCE: [u8; 12] = [0u8; 12];

/// Ciphertext addressed to a single recipient public key.
///
/// Wire format: `ephemeral_public_key (32) || ciphertext || tag (16)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBox {
    /// Ephemeral X25519 public key (32 bytes).
    pub ephemeral_public_key: [u8; KEY_SIZE],
    /// AEAD ciphertext including the trailing tag.
    pub ciphertext: Vec<u8>,
}

impl SealedBox {
    /// Encode to the opaque byte form stored on-ledger.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(KEY_SIZE + self.ciphertext.len());
        data.extend_from_slice(&self.ephemeral_public_key);
        data.extend_from_slice(&self.ciphertext);
        data
    }

    /// Split raw bytes into a box; `None` if too short to hold a key and tag.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < SEALED_BOX_OVERHEAD {
            return None;
        }
        let mut ephemeral_public_key = [0u8; KEY_SIZE];
        ephemeral_public_key.copy_from_slice(&data[..KEY_SIZE]);
        Some(Self {
            ephemeral_public_key,
            ciphertext: data[KEY_SIZE..].to_vec(),
        })
    }

    /// Encoded length in bytes; never less than the 48-byte overhead.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        KEY_SIZE + self.ciphertext.len()
    }
}

fn derive_box_key(
    shared_secret: &[u8; KEY_SIZE],
    ephemeral_public_key: &[u8; KEY_SIZE],
    recipient_public_key: &[u8; KEY_SIZE],
) -> Zeroizing<[u8; KEY_SIZE]> {
    let mut info = Vec::with_capacity(SEALED_BOX_INFO_PREFIX.len() + 2 * KEY_SIZE);
    info.extend_from_slice(SEALED_BOX_INFO_PREFIX);
    info.extend_from_slice(ephemeral_public_key);
    info.extend_from_slice(recipient_public_key);

    let hkdf = Hkdf::<Sha256>::new(Some(ephemeral_public_key), shared_secret);
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    hkdf.expand(&info, &mut *key)
        .expect("32 bytes is a valid length for HKDF-SHA256");
    key
}

/// Encrypt `plaintext` so that only the holder of `recipient_public_key`'s
/// secret key can open it.
///
/// Fails only if the recipient key is a low-order point.
pub fn seal(plaintext: &[u8], recipient_public_key: &PublicKey) -> Result<SealedBox> {
    let (ephemeral_private, ephemeral_public) = generate_ephemeral_keypair();

    let shared_secret = x25519_ecdh(&ephemeral_private, recipient_public_key);
    if !shared_secret.was_contributory() {
        return Err(SuiChatError::InvalidPublicKey(
            "recipient key is a low-order point".to_string(),
        ));
    }

    let key = derive_box_key(
        shared_secret.as_bytes(),
        ephemeral_public.as_bytes(),
        recipient_public_key.as_bytes(),
    );

    let cipher = ChaCha20Poly1305::new_from_slice(&*key)
        .map_err(|e| SuiChatError::EncryptionError(format!("Cipher init failed: {}", e)))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&SEALED_BOX_NONCE), plaintext)
        .map_err(|e| SuiChatError::EncryptionError(format!("Sealing failed: {}", e)))?;

    Ok(SealedBox {
        ephemeral_public_key: *ephemeral_public.as_bytes(),
        ciphertext,
    })
}

/// Open a sealed box with the recipient's secret key.
///
/// Every failure (wrong key, truncation, tampering) returns `None`.
pub fn open(sealed: &SealedBox, recipient_secret_key: &StaticSecret) -> Option<Vec<u8>> {
    let ephemeral_public = PublicKey::from(sealed.ephemeral_public_key);
    let recipient_public = PublicKey::from(recipient_secret_key);

    let shared_secret = x25519_ecdh(recipient_secret_key, &ephemeral_public);
    if !shared_secret.was_contributory() {
        return None;
    }

    let key = derive_box_key(
        shared_secret.as_bytes(),
        &sealed.ephemeral_public_key,
        recipient_public.as_bytes(),
    );

    let cipher = ChaCha20Poly1305::new_from_slice(&*key).ok()?;
    cipher
        .decrypt(Nonce::from_slice(&SEALED_BOX_NONCE), sealed.ciphertext.as_slice())
        .ok()
}

/// Open a sealed box given in its raw byte form.
pub fn open_bytes(data: &[u8], recipient_secret_key: &StaticSecret) -> Option<Vec<u8>> {
    open(&SealedBox::from_bytes(data)?, recipient_secret_key)
}
