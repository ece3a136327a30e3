//! Session-key derivation.
//!
//! HKDF (extract-then-expand, RFC 5869 construction) instantiated with
//! keyed BLAKE3. The info string binds the full handshake transcript:
//! both ephemeral contributions, in initiator-then-responder order, so
//! a peer that substitutes either contribution derives a different key.

use crate::ecdh::{Contribution, SharedSecret};
use crate::{aead::SessionKey, SESSION_KEY_SIZE};

/// Domain label mixed into every session-key derivation.
const SESSION_KEY_LABEL: &[u8] = b"keybridge ecdhe session v1";

/// Derive the symmetric session key for one relay session.
///
/// Deterministic: both peers compute identical output from the shared
/// secret and the two contributions. The initiator is the side that
/// sent its contribution first.
#[must_use]
pub fn derive_session_key(
    shared: &SharedSecret,
    initiator: &Contribution,
    responder: &Contribution,
) -> SessionKey {
    let prk = extract(shared.as_bytes());

    let mut info = Vec::with_capacity(SESSION_KEY_LABEL.len() + 64);
    info.extend_from_slice(SESSION_KEY_LABEL);
    info.extend_from_slice(initiator.as_bytes());
    info.extend_from_slice(responder.as_bytes());

    let mut key = [0u8; SESSION_KEY_SIZE];
    expand(&prk, &info, &mut key);
    SessionKey::new(key)
}

/// HKDF-Extract with an empty salt: hash the input key material down to
/// a pseudorandom key.
fn extract(ikm: &[u8]) -> [u8; 32] {
    *blake3::hash(ikm).as_bytes()
}

/// HKDF-Expand: stretch the pseudorandom key over the info string.
fn expand(prk: &[u8; 32], info: &[u8], output: &mut [u8]) {
    let mut hasher = blake3::Hasher::new_keyed(prk);
    hasher.update(info);
    hasher.finalize_xof().fill(output);
}
