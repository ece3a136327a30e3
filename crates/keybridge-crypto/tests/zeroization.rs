//! Zeroization guarantees for sensitive key material.
//!
//! The primary guarantee is the type system: everything that holds a
//! secret implements `ZeroizeOnDrop`, so teardown on any path (normal
//! return, error, or panic) clears the memory.

use keybridge_crypto::{EphemeralKeypair, SessionKey, SharedSecret, SigningKey};

/// Compile-time verification that secret-bearing types zeroize on drop.
#[test]
fn secret_types_zeroize_on_drop() {
    fn assert_zeroize_on_drop<T: zeroize::ZeroizeOnDrop>() {}

    assert_zeroize_on_drop::<SessionKey>();
    assert_zeroize_on_drop::<SharedSecret>();
    assert_zeroize_on_drop::<SigningKey>();

    // The ephemeral private half lives inside x25519_dalek's
    // EphemeralSecret, which zeroizes itself on drop and is consumed by
    // the key agreement.
}

#[test]
fn shared_secret_is_dropped_by_agreement() {
    let ours = EphemeralKeypair::generate();
    let theirs = EphemeralKeypair::generate();
    let their_contribution = theirs.contribution();

    // `agree` consumes the keypair: the private half cannot be used a
    // second time, and the derived secret clears itself when dropped.
    let shared = ours.agree(&their_contribution).unwrap();
    drop(shared);
}

#[test]
#[should_panic(expected = "intentional panic")]
fn session_key_cleanup_runs_on_panic() {
    let _key = SessionKey::new([0x56; 32]);
    panic!("intentional panic");
}
