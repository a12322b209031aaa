//! End-to-end room key exchange between derived identities.

use std::collections::HashMap;

use suichat::{
    decrypt_message, derive_keypair, encrypt_message, from_base64, parse_public_key_base64,
    to_base64, ChatSession, DecryptOutcome, RoomKey, RoomKeyManager,
};

fn test_messages() -> HashMap<&'static str, String> {
    let mut messages = HashMap::new();
    messages.insert("empty", String::new());
    messages.insert("single_char", "X".to_string());
    messages.insert("whitespace", "   \t\n   ".to_string());
    messages.insert("punctuation", "!@#$%^&*()_+-=[]{}\\|;':\",./<>?".to_string());
    messages.insert("emoji_zwj", "Family: 👨‍👩‍👧‍👦".to_string());
    messages.insert("chinese", "你好 Alice！很高興認識你".to_string());
    messages.insert("arabic", "مرحبا بالعالم".to_string());
    messages.insert("json", r#"{"key": "value", "num": 42}"#.to_string());
    messages.insert("long", "The quick brown fox jumps over the lazy dog. ".repeat(250));
    messages
}

#[test]
fn members_share_room_key_and_messages() {
    let alice = derive_keypair(&[0x11; 64]);
    let bob = derive_keypair(&[0x22; 64]);
    let manager = RoomKeyManager::new();

    let room_key = manager.create_room_key();
    let for_alice = manager.seal_for_member(&room_key, alice.public_key()).unwrap();
    let for_bob = manager.seal_for_member(&room_key, bob.public_key()).unwrap();

    let alice_key = manager.unseal_own_copy(&for_alice, alice.secret_key()).unwrap();
    let bob_key = manager.unseal_own_copy(&for_bob, bob.secret_key()).unwrap();
    assert_eq!(alice_key, room_key);
    assert_eq!(bob_key, room_key);

    let from_alice = encrypt_message("Hi Bob! 🚀", alice_key.as_bytes()).unwrap();
    assert_eq!(
        decrypt_message(&from_alice, bob_key.as_bytes()).as_deref(),
        Some("Hi Bob! 🚀")
    );

    for (name, text) in test_messages() {
        let from_bob = encrypt_message(&text, bob_key.as_bytes()).unwrap();
        assert_eq!(
            decrypt_message(&from_bob, alice_key.as_bytes()),
            Some(text),
            "message {}",
            name
        );
    }
}

#[test]
fn outsider_learns_nothing() {
    let alice = derive_keypair(&[0xAA; 64]);
    let bob = derive_keypair(&[0xBB; 64]);
    let eve = derive_keypair(&[0xEE; 64]);
    let manager = RoomKeyManager::new();

    let room_key = manager.create_room_key();
    let for_alice = manager.seal_for_member(&room_key, alice.public_key()).unwrap();
    let for_bob = manager.seal_for_member(&room_key, bob.public_key()).unwrap();

    assert!(manager.unseal_own_copy(&for_alice, eve.secret_key()).is_none());
    assert!(manager.unseal_own_copy(&for_bob, eve.secret_key()).is_none());

    let encrypted = encrypt_message("This is a secret!", room_key.as_bytes()).unwrap();
    for _ in 0..16 {
        let guess = RoomKey::generate();
        assert!(decrypt_message(&encrypted, guess.as_bytes()).is_none());
    }
    assert!(decrypt_message(&encrypted, &eve.secret_key_bytes()).is_none());
    assert!(decrypt_message(&encrypted, &eve.public_key_bytes()).is_none());
}

#[test]
fn public_key_survives_profile_roundtrip() {
    let keypair = derive_keypair(&[0x55; 64]);
    let manager = RoomKeyManager::new();

    let published = to_base64(&keypair.public_key_bytes());
    let recovered = parse_public_key_base64(&published).unwrap();
    assert_eq!(from_base64(&published).unwrap(), keypair.public_key_bytes());

    let room_key = manager.create_room_key();
    let stored = manager.seal_for_member_base64(&room_key, &recovered).unwrap();
    assert_eq!(from_base64(&stored).unwrap().len(), 32 + 48);
    assert_eq!(
        manager.unseal_own_copy_base64(&stored, keypair.secret_key()),
        Some(room_key)
    );
}

#[test]
fn sessions_distinguish_public_and_failed() {
    let creator = ChatSession::from_signature("0xa11ce", &[0x01; 64]);
    let member = ChatSession::from_signature("0xb0b", &[0x02; 64]);
    let outsider = ChatSession::from_signature("0xeve", &[0x03; 64]);
    let manager = RoomKeyManager::new();

    let creator_pk = parse_public_key_base64(&creator.public_key_base64()).unwrap();
    let member_pk = parse_public_key_base64(&member.public_key_base64()).unwrap();

    let room_key = manager.create_room_key();
    let entries = manager
        .seal_for_members(
            &room_key,
            [(creator.address(), &creator_pk), (member.address(), &member_pk)],
        )
        .unwrap();

    let creator_room = creator
        .room_encryption(Some(&entries[0].encrypted_key))
        .unwrap();
    let body = creator_room.encrypt("welcome").unwrap();

    assert_eq!(
        member.read_message(Some(&entries[1].encrypted_key), &body),
        DecryptOutcome::Decrypted("welcome".to_string())
    );
    assert_eq!(
        outsider.read_message(Some(&entries[1].encrypted_key), &body),
        DecryptOutcome::DecryptionFailed
    );
    assert_eq!(member.read_message(None, "hello"), DecryptOutcome::NotEncrypted);
}
