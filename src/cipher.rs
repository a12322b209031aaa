//! Authenticated encryption of message bodies under a shared room key.

use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use rand::rngs::OsRng;

use crate::envelope::EncryptedMessage;
use crate::types::{Result, SuiChatError, KEY_SIZE, MESSAGE_NONCE_SIZE, MESSAGE_VERSION};

/// Encrypt a message under a room key.
///
/// A fresh random 24-byte nonce is drawn for every call, so encrypting the
/// same text twice yields different output. The version byte is bound as
/// associated data.
///
/// # Returns
/// Base64 of `version || nonce || ciphertext || tag`
pub fn encrypt_message(message: &str, key: &[u8; KEY_SIZE]) -> Result<String> {
    let cipher = XChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| SuiChatError::EncryptionError(format!("Cipher init failed: {}", e)))?;
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: message.as_bytes(),
                aad: &[MESSAGE_VERSION],
            },
        )
        .map_err(|e| SuiChatError::EncryptionError(format!("Encryption failed: {}", e)))?;

    let mut nonce_bytes = [0u8; MESSAGE_NONCE_SIZE];
    nonce_bytes.copy_from_slice(nonce.as_slice());

    Ok(EncryptedMessage {
        version: MESSAGE_VERSION,
        nonce: nonce_bytes,
        ciphertext,
    }
    .to_base64())
}

/// Decrypt a base64 message body.
///
/// Returns `None` for invalid base64, an unknown version, a wrong key, any
/// tampering, or a plaintext that is not UTF-8.
pub fn decrypt_message(encoded: &str, key: &[u8; KEY_SIZE]) -> Option<String> {
    let message = EncryptedMessage::from_base64(encoded)?;

    let cipher = XChaCha20Poly1305::new_from_slice(key).ok()?;
    let plaintext = cipher
        .decrypt(
            XNonce::from_slice(&message.nonce),
            Payload {
                msg: &message.ciphertext,
                aad: &[message.version],
            },
        )
        .ok()?;

    String::from_utf8(plaintext).ok()
}
