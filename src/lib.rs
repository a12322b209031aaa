//! Sui Chat - client-side security for on-ledger chat
//!
//! Encryption keys derived from a wallet signature, sealed-box distribution
//! of room keys, XChaCha20-Poly1305 message bodies, and the sponsored
//! transaction protocol for zero-balance accounts.

mod types;
mod encoding;
mod keys;
mod sealed_box;
mod envelope;
mod cipher;
mod room;
mod wallet;
mod session;
mod transaction;
mod sponsor;
mod config;
mod http;
mod rate_limit;

pub use types::*;
pub use encoding::*;
pub use keys::*;
pub use sealed_box::*;
pub use envelope::*;
pub use cipher::*;
pub use room::*;
pub use wallet::*;
pub use session::*;
pub use transaction::*;
pub use sponsor::*;
pub use config::*;
pub use http::*;
pub use rate_limit::*;
