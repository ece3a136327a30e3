//! Ephemeral X25519 key agreement (RFC 7748).
//!
//! One keypair is generated per inbound session. The private half is
//! consumed by the Diffie-Hellman computation and cannot outlive it;
//! the resulting shared secret is zeroized on drop.

use rand_core::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, CONTRIBUTION_SIZE};

/// A public ephemeral contribution (32 bytes), exchanged during the
/// handshake and signed by the sender's long-term key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contribution([u8; CONTRIBUTION_SIZE]);

impl Contribution {
    /// Create a contribution from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; CONTRIBUTION_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create a contribution from a wire blob.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPublicKey`] if the blob is not
    /// exactly 32 bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; CONTRIBUTION_SIZE] = slice
            .try_into()
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Raw bytes of the contribution.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; CONTRIBUTION_SIZE] {
        &self.0
    }
}

/// An ephemeral X25519 keypair, generated per session.
pub struct EphemeralKeypair {
    secret: x25519_dalek::EphemeralSecret,
    public: Contribution,
}

impl EphemeralKeypair {
    /// Generate a fresh keypair from the OS CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let secret = x25519_dalek::EphemeralSecret::random_from_rng(OsRng);
        let public = Contribution(*x25519_dalek::PublicKey::from(&secret).as_bytes());
        Self { secret, public }
    }

    /// The public contribution to send to the peer.
    #[must_use]
    pub fn contribution(&self) -> Contribution {
        self.public
    }

    /// Perform the Diffie-Hellman computation with the peer's
    /// contribution, consuming the private half.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::WeakSharedSecret`] if the peer supplied a
    /// low-order point and the result is all zeros.
    pub fn agree(self, peer: &Contribution) -> Result<SharedSecret, CryptoError> {
        let peer_public = x25519_dalek::PublicKey::from(peer.0);
        let shared = self.secret.diffie_hellman(&peer_public);

        if shared.as_bytes() == &[0u8; 32] {
            return Err(CryptoError::WeakSharedSecret);
        }

        Ok(SharedSecret(*shared.as_bytes()))
    }
}

/// The raw ECDH shared secret (32 bytes), zeroized on drop.
///
/// Only ever fed to the session-key derivation; never used directly as
/// an encryption key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; 32]);

impl SharedSecret {
    /// Shared secret bytes, for key derivation input.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}
