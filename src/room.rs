//! Room key creation and distribution.
//!
//! A private room has one symmetric [`RoomKey`]. Each member receives a copy
//! sealed to their published encryption key; the manager itself holds no
//! state and performs no I/O.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher::{decrypt_message, encrypt_message};
use crate::encoding::{from_base64, to_base64};
use crate::sealed_box::{open, open_bytes, seal, SealedBox};
use crate::types::{Result, KEY_SIZE};

/// Shared symmetric key for one encrypted room.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct RoomKey([u8; KEY_SIZE]);

impl RoomKey {
    /// Generate a new random room key.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RoomKey(<redacted>)")
    }
}

/// A member's sealed copy of the room key, as written to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberKeyEntry {
    /// Member's Sui address.
    pub address: String,
    /// Base64 of the sealed room key.
    pub encrypted_key: String,
}

/// Stateless orchestration of room key sealing.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoomKeyManager;

impl RoomKeyManager {
    pub fn new() -> Self {
        Self
    }

    /// Mint a fresh room key.
    pub fn create_room_key(&self) -> RoomKey {
        RoomKey::generate()
    }

    /// Seal the room key to one member's public key.
    pub fn seal_for_member(&self, room_key: &RoomKey, member_public_key: &PublicKey) -> Result<SealedBox> {
        seal(room_key.as_bytes(), member_public_key)
    }

    /// Recover the room key from our own sealed copy.
    pub fn unseal_own_copy(&self, sealed: &SealedBox, my_secret_key: &StaticSecret) -> Option<RoomKey> {
        room_key_from_plaintext(open(sealed, my_secret_key)?)
    }

    /// Seal the room key and encode it for storage on-ledger.
    pub fn seal_for_member_base64(&self, room_key: &RoomKey, member_public_key: &PublicKey) -> Result<String> {
        Ok(to_base64(&self.seal_for_member(room_key, member_public_key)?.to_bytes()))
    }

    /// Recover the room key from a base64 copy read from the ledger.
    pub fn unseal_own_copy_base64(&self, encrypted_key: &str, my_secret_key: &StaticSecret) -> Option<RoomKey> {
        let data = from_base64(encrypted_key).ok()?;
        room_key_from_plaintext(open_bytes(&data, my_secret_key)?)
    }

    /// Seal a copy of the room key for every member.
    pub fn seal_for_members<'a, I>(&self, room_key: &RoomKey, members: I) -> Result<Vec<MemberKeyEntry>>
    where
        I: IntoIterator<Item = (&'a str, &'a PublicKey)>,
    {
        members
            .into_iter()
            .map(|(address, public_key)| {
                Ok(MemberKeyEntry {
                    address: address.to_string(),
                    encrypted_key: self.seal_for_member_base64(room_key, public_key)?,
                })
            })
            .collect()
    }
}

fn room_key_from_plaintext(mut plaintext: Vec<u8>) -> Option<RoomKey> {
    let key = <[u8; KEY_SIZE]>::try_from(plaintext.as_slice()).ok().map(RoomKey);
    plaintext.zeroize();
    key
}

/// Result of opening a message body at the room level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptOutcome {
    /// Body was encrypted and opened successfully.
    Decrypted(String),
    /// Room is public; the body is plaintext and there is nothing to decrypt.
    NotEncrypted,
    /// Body could not be opened with our room key.
    DecryptionFailed,
}

/// Encryption mode of a room from the current member's point of view.
#[derive(Debug, Clone)]
pub enum RoomEncryption {
    /// Public room; bodies are stored in clear.
    Public,
    /// Private room with the member's recovered room key.
    Private(RoomKey),
}

impl RoomEncryption {
    pub fn is_encrypted(&self) -> bool {
        matches!(self, RoomEncryption::Private(_))
    }

    /// Prepare a body for sending; public rooms pass text through unchanged.
    pub fn encrypt(&self, message: &str) -> Result<String> {
        match self {
            RoomEncryption::Public => Ok(message.to_string()),
            RoomEncryption::Private(key) => encrypt_message(message, key.as_bytes()),
        }
    }

    pub fn decrypt(&self, body: &str) -> DecryptOutcome {
        match self {
            RoomEncryption::Public => DecryptOutcome::NotEncrypted,
            RoomEncryption::Private(key) => match decrypt_message(body, key.as_bytes()) {
                Some(text) => DecryptOutcome::Decrypted(text),
                None => DecryptOutcome::DecryptionFailed,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::derive_keypair;

    #[test]
    fn test_room_keys_are_random() {
        let manager = RoomKeyManager::new();
        let first = manager.create_room_key();
        let second = manager.create_room_key();
        assert_eq!(first.as_bytes().len(), 32);
        assert_ne!(first, second);
    }

    #[test]
    fn test_seal_and_unseal() {
        let manager = RoomKeyManager::new();
        let member = derive_keypair(&[0x11; 64]);
        let room_key = manager.create_room_key();

        let sealed = manager.seal_for_member(&room_key, member.public_key()).unwrap();
        assert_eq!(sealed.len(), 32 + 48);

        let recovered = manager.unseal_own_copy(&sealed, member.secret_key()).unwrap();
        assert_eq!(recovered, room_key);
    }

    #[test]
    fn test_unseal_with_wrong_key() {
        let manager = RoomKeyManager::new();
        let member = derive_keypair(&[0x11; 64]);
        let outsider = derive_keypair(&[0xEE; 64]);
        let room_key = manager.create_room_key();

        let encoded = manager.seal_for_member_base64(&room_key, member.public_key()).unwrap();
        assert!(manager.unseal_own_copy_base64(&encoded, outsider.secret_key()).is_none());
        assert!(manager.unseal_own_copy_base64("%%%", member.secret_key()).is_none());
    }

    #[test]
    fn test_sealed_non_key_is_rejected() {
        let manager = RoomKeyManager::new();
        let member = derive_keypair(&[0x11; 64]);

        let sealed = seal(b"not thirty-two bytes", member.public_key()).unwrap();
        assert!(manager.unseal_own_copy(&sealed, member.secret_key()).is_none());
    }

    #[test]
    fn test_seal_for_members() {
        let manager = RoomKeyManager::new();
        let alice = derive_keypair(&[0xAA; 64]);
        let bob = derive_keypair(&[0xBB; 64]);
        let room_key = manager.create_room_key();

        let entries = manager
            .seal_for_members(
                &room_key,
                [("0xa11ce", alice.public_key()), ("0xb0b", bob.public_key())],
            )
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].address, "0xb0b");
        let bob_copy = manager
            .unseal_own_copy_base64(&entries[1].encrypted_key, bob.secret_key())
            .unwrap();
        assert_eq!(bob_copy, room_key);
        assert!(manager
            .unseal_own_copy_base64(&entries[0].encrypted_key, bob.secret_key())
            .is_none());
    }

    #[test]
    fn test_room_encryption_outcomes() {
        let private = RoomEncryption::Private(RoomKey::generate());
        let body = private.encrypt("hello room").unwrap();
        assert_ne!(body, "hello room");
        assert_eq!(private.decrypt(&body), DecryptOutcome::Decrypted("hello room".into()));

        let other = RoomEncryption::Private(RoomKey::generate());
        assert_eq!(other.decrypt(&body), DecryptOutcome::DecryptionFailed);

        let public = RoomEncryption::Public;
        assert!(!public.is_encrypted());
        assert_eq!(public.encrypt("plain").unwrap(), "plain");
        assert_eq!(public.decrypt("plain"), DecryptOutcome::NotEncrypted);
    }

    #[test]
    fn test_room_key_debug_is_redacted() {
        let key = RoomKey::from_bytes([9u8; 32]);
        assert_eq!(format!("{:?}", key), "RoomKey(<redacted>)");
    }
}
