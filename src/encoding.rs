//! Base64 helpers for values stored on-ledger as strings.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::types::{Result, SuiChatError};

/// Encode bytes as standard padded base64.
pub fn to_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode standard padded base64.
pub fn from_base64(encoded: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(encoded)
        .map_err(|e| SuiChatError::InvalidEncoding(format!("base64: {}", e)))
}
