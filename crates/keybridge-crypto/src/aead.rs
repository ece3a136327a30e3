//! `ChaCha20-Poly1305` frame sealing for the post-handshake channel.
//!
//! Nonces are never random: each one is a 4-byte direction tag followed
//! by a 64-bit big-endian counter supplied by the channel layer. The
//! two directions use distinct tags, so a (key, nonce) pair cannot
//! collide even when the counters align, and a sealed record reflected
//! back at its sender will not open.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305,
};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, NONCE_SIZE, SESSION_KEY_SIZE};

/// Which way a sealed frame travels on the inbound channel.
///
/// The initiator is the peer that sends its handshake contribution
/// first; the proxy is the responder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Frames sealed by the initiator, opened by the responder.
    InitiatorToResponder,
    /// Frames sealed by the responder, opened by the initiator.
    ResponderToInitiator,
}

impl Direction {
    /// The peer's sealing direction for frames we open.
    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            Self::InitiatorToResponder => Self::ResponderToInitiator,
            Self::ResponderToInitiator => Self::InitiatorToResponder,
        }
    }

    fn tag(self) -> [u8; 4] {
        match self {
            Self::InitiatorToResponder => 1u32.to_be_bytes(),
            Self::ResponderToInitiator => 2u32.to_be_bytes(),
        }
    }
}

fn build_nonce(direction: Direction, counter: u64) -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    nonce[..4].copy_from_slice(&direction.tag());
    nonce[4..].copy_from_slice(&counter.to_be_bytes());
    nonce
}

/// Symmetric session key derived from the handshake. Zeroized on drop.
///
/// The key itself is stateless; the channel layer owns the per-direction
/// counters and guarantees no (direction, counter) pair is reused.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; SESSION_KEY_SIZE]);

impl SessionKey {
    /// Wrap raw derived key bytes.
    #[must_use]
    pub fn new(bytes: [u8; SESSION_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Seal a payload under the nonce `(direction, counter)`.
    ///
    /// Returns ciphertext with the 16-byte authentication tag appended.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::SealFailed`] if AEAD encryption fails.
    pub fn seal(
        &self,
        direction: Direction,
        counter: u64,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let cipher = ChaCha20Poly1305::new((&self.0).into());
        let nonce = build_nonce(direction, counter);
        cipher
            .encrypt((&nonce).into(), plaintext)
            .map_err(|_| CryptoError::SealFailed)
    }

    /// Open a sealed record under the nonce `(direction, counter)`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::OpenFailed`] if authentication fails for
    /// any reason: tampering, a wrong counter, or the wrong direction.
    pub fn open(
        &self,
        direction: Direction,
        counter: u64,
        sealed: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let cipher = ChaCha20Poly1305::new((&self.0).into());
        let nonce = build_nonce(direction, counter);
        cipher
            .decrypt((&nonce).into(), sealed)
            .map_err(|_| CryptoError::OpenFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TAG_SIZE;

    fn test_key() -> SessionKey {
        SessionKey::new([0x42; SESSION_KEY_SIZE])
    }

    #[test]
    fn seal_open_roundtrip() {
        let key = test_key();
        let sealed = key
            .seal(Direction::InitiatorToResponder, 7, b"hello")
            .unwrap();
        assert_eq!(sealed.len(), 5 + TAG_SIZE);
        let opened = key.open(Direction::InitiatorToResponder, 7, &sealed).unwrap();
        assert_eq!(opened, b"hello");
    }

    #[test]
    fn empty_payload_roundtrip() {
        let key = test_key();
        let sealed = key.seal(Direction::ResponderToInitiator, 0, b"").unwrap();
        assert_eq!(sealed.len(), TAG_SIZE);
        let opened = key.open(Direction::ResponderToInitiator, 0, &sealed).unwrap();
        assert!(opened.is_empty());
    }

    #[test]
    fn wrong_counter_fails_to_open() {
        let key = test_key();
        let sealed = key.seal(Direction::InitiatorToResponder, 3, b"payload").unwrap();
        assert!(key.open(Direction::InitiatorToResponder, 4, &sealed).is_err());
    }

    #[test]
    fn wrong_direction_fails_to_open() {
        let key = test_key();
        let sealed = key.seal(Direction::InitiatorToResponder, 0, b"payload").unwrap();
        assert!(matches!(
            key.open(Direction::ResponderToInitiator, 0, &sealed),
            Err(CryptoError::OpenFailed)
        ));
    }

    #[test]
    fn any_flipped_bit_fails_to_open() {
        let key = test_key();
        let sealed = key.seal(Direction::InitiatorToResponder, 0, b"payload").unwrap();

        for byte in 0..sealed.len() {
            let mut tampered = sealed.clone();
            tampered[byte] ^= 0x01;
            assert!(
                key.open(Direction::InitiatorToResponder, 0, &tampered).is_err(),
                "flip at byte {byte} must not open"
            );
        }
    }

    #[test]
    fn wrong_key_fails_to_open() {
        let sealed = test_key()
            .seal(Direction::InitiatorToResponder, 0, b"payload")
            .unwrap();
        let other = SessionKey::new([0x43; SESSION_KEY_SIZE]);
        assert!(other.open(Direction::InitiatorToResponder, 0, &sealed).is_err());
    }

    #[test]
    fn directions_reverse() {
        assert_eq!(
            Direction::InitiatorToResponder.reverse(),
            Direction::ResponderToInitiator
        );
        assert_eq!(
            Direction::ResponderToInitiator.reverse(),
            Direction::InitiatorToResponder
        );
    }
}
