//! Walks three identities through a private room.
//!
//! Run with `RUST_LOG=debug cargo run --example room_key_exchange`.

use suichat::{
    parse_public_key_base64, ChatSession, DecryptOutcome, RoomKeyManager, Result,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Stand-ins for wallet signatures over the key-derivation message.
    let alice = ChatSession::from_signature("0xa11ce", &[0xA1; 64]);
    let bob = ChatSession::from_signature("0xb0b", &[0xB0; 64]);
    let carol = ChatSession::from_signature("0xca201", &[0xCA; 64]);

    for session in [&alice, &bob, &carol] {
        info!(address = session.address(), public_key = %session.public_key_base64(), "published key");
    }

    // Alice creates the room and invites Bob; Carol stays outside.
    let manager = RoomKeyManager::new();
    let room_key = manager.create_room_key();
    let alice_pk = parse_public_key_base64(&alice.public_key_base64())?;
    let bob_pk = parse_public_key_base64(&bob.public_key_base64())?;
    let entries = manager.seal_for_members(
        &room_key,
        [(alice.address(), &alice_pk), (bob.address(), &bob_pk)],
    )?;
    for entry in &entries {
        info!(member = %entry.address, encrypted_key = %entry.encrypted_key, "sealed room key");
    }

    let Some(room) = alice.room_encryption(Some(&entries[0].encrypted_key)) else {
        info!("alice could not open her own room key copy");
        return Ok(());
    };
    let body = room.encrypt("Welcome to the room, Bob!")?;
    info!(%body, "alice posted");

    match bob.read_message(Some(&entries[1].encrypted_key), &body) {
        DecryptOutcome::Decrypted(text) => info!(%text, "bob read"),
        other => info!(?other, "bob could not read"),
    }

    // Carol has somehow obtained Bob's entry but not his secret key.
    let outcome = carol.read_message(Some(&entries[1].encrypted_key), &body);
    info!(?outcome, "carol tried");

    Ok(())
}
