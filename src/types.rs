//! Type definitions and protocol constants for Sui Chat.

use std::fmt;

use thiserror::Error;

/// Message the wallet signs once to seed the encryption keypair.
pub const SIGN_MESSAGE: &str = "sui-chat:derive-encryption-key:v1";

/// Current encrypted-message format version byte.
pub const MESSAGE_VERSION: u8 = 0x01;

/// Size of an X25519 public or secret key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of the Poly1305 authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Size of the XChaCha20 nonce used for message bodies.
pub const MESSAGE_NONCE_SIZE: usize = 24;

/// Encrypted message header: version byte followed by the nonce.
pub const MESSAGE_HEADER_SIZE: usize = 1 + MESSAGE_NONCE_SIZE;

/// Fixed overhead of a sealed box (ephemeral public key + tag).
pub const SEALED_BOX_OVERHEAD: usize = KEY_SIZE + TAG_SIZE;

/// Size of a Sui address in bytes.
pub const ADDRESS_SIZE: usize = 32;

/// Key derivation salt.
pub const KEY_DERIVATION_SALT: &[u8] = b"SuiChat-v1-encryption";

/// Key derivation info.
pub const KEY_DERIVATION_INFO: &[u8] = b"x25519-key";

/// Info prefix for sealed-box key derivation.
pub const SEALED_BOX_INFO_PREFIX: &[u8] = b"SuiChatV1-SealedBox";

/// Default number of messages allowed per rate-limit window.
pub const MESSAGE_RATE_LIMIT: u32 = 20;

/// Stage of the sponsored-transaction protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SponsorshipStage {
    /// Unsigned, gas-free transaction kind bound to a sender.
    Built,
    /// Sponsor has attached gas and returned a tracking digest.
    Sponsored,
    /// User has signed the sponsor-returned bytes.
    Signed,
    /// Finalize endpoint has submitted the transaction.
    Executed,
}

impl fmt::Display for SponsorshipStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SponsorshipStage::Built => "build",
            SponsorshipStage::Sponsored => "sponsor",
            SponsorshipStage::Signed => "sign",
            SponsorshipStage::Executed => "execute",
        };
        f.write_str(name)
    }
}

/// Protocol or transport failure while talking to the sponsor backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} failed: {reason}")]
pub struct SponsorError {
    /// Stage that was being attempted.
    pub stage: SponsorshipStage,
    /// Upstream HTTP status, if a response was received.
    pub status: Option<u16>,
    /// Human-readable reason.
    pub reason: String,
}

impl SponsorError {
    /// Creates an error with no upstream status.
    pub fn new(stage: SponsorshipStage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            status: None,
            reason: reason.into(),
        }
    }

    /// Attaches an upstream HTTP status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Errors that can occur during Sui Chat operations.
///
/// Failed decryption is deliberately absent: opening a sealed box or an
/// encrypted message yields `None` instead.
#[derive(Error, Debug)]
pub enum SuiChatError {
    // Crypto Errors
    /// Invalid public key format.
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    /// Invalid base64 or other text encoding.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    // Ledger Errors
    /// Invalid Sui address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Transaction bytes could not be decoded.
    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),

    /// Sponsor returned a transaction that differs from the one we built.
    #[error("Sponsored transaction does not match built transaction: {0}")]
    TransactionMismatch(String),

    // Wallet Errors
    /// The wallet refused or failed to sign.
    #[error("Signing rejected: {0}")]
    SigningRejected(String),

    // Network Errors
    /// Sponsor backend failure.
    #[error(transparent)]
    Sponsor(#[from] SponsorError),

    /// HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(String),
}

pub type Result<T> = std::result::Result<T, SuiChatError>;
