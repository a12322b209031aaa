//! Wire format for encrypted message bodies.

use crate::encoding::{from_base64, to_base64};
use crate::types::{MESSAGE_HEADER_SIZE, MESSAGE_NONCE_SIZE, MESSAGE_VERSION, TAG_SIZE};

/// Encrypted message body as stored on-ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedMessage {
    /// Format version.
    pub version: u8,
    /// XChaCha20 nonce (24 bytes).
    pub nonce: [u8; MESSAGE_NONCE_SIZE],
    /// Ciphertext with trailing Poly1305 tag.
    pub ciphertext: Vec<u8>,
}

impl EncryptedMessage {
    /// Encode the message to bytes.
    ///
    /// Format (25-byte header + ciphertext):
    /// - [0]     version (0x01)
    /// - [1-24]  nonce (24 bytes)
    /// - [25+]   ciphertext || tag
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(MESSAGE_HEADER_SIZE + self.ciphertext.len());
        data.push(self.version);
        data.extend_from_slice(&self.nonce);
        data.extend_from_slice(&self.ciphertext);
        data
    }

    /// Decode bytes; `None` if too short or the version is not supported.
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < MESSAGE_HEADER_SIZE + TAG_SIZE {
            return None;
        }

        let version = data[0];
        if version != MESSAGE_VERSION {
            return None;
        }

        let mut nonce = [0u8; MESSAGE_NONCE_SIZE];
        nonce.copy_from_slice(&data[1..MESSAGE_HEADER_SIZE]);

        Some(Self {
            version,
            nonce,
            ciphertext: data[MESSAGE_HEADER_SIZE..].to_vec(),
        })
    }

    /// Base64 transport form.
    pub fn to_base64(&self) -> String {
        to_base64(&self.encode())
    }

    /// Parse the base64 transport form.
    pub fn from_base64(encoded: &str) -> Option<Self> {
        Self::decode(&from_base64(encoded).ok()?)
    }
}
