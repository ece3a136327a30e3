//! Ed25519 signing and verification of handshake contributions.
//!
//! Each side of the inbound channel signs its ephemeral contribution
//! with a long-term key provisioned out of band, so a handshake cannot
//! be completed by anyone who does not hold the expected identity.

use ed25519_dalek::{Signer, Verifier};
use zeroize::ZeroizeOnDrop;

use crate::{CryptoError, SIGNATURE_SIZE};

/// Ed25519 signature (64 bytes)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    /// Create a signature from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create a signature from a wire blob.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidSignature`] if the blob is not
    /// exactly 64 bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; SIGNATURE_SIZE] = slice
            .try_into()
            .map_err(|_| CryptoError::InvalidSignature)?;
        Ok(Self(bytes))
    }

    /// Raw signature bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    fn to_dalek(self) -> ed25519_dalek::Signature {
        ed25519_dalek::Signature::from_bytes(&self.0)
    }
}

/// Long-term Ed25519 signing key. Zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct SigningKey {
    inner: ed25519_dalek::SigningKey,
}

impl SigningKey {
    pub(crate) fn from_dalek(inner: ed25519_dalek::SigningKey) -> Self {
        Self { inner }
    }

    /// Sign a message. Ed25519 signing is deterministic.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.inner.sign(message).to_bytes())
    }

    /// The corresponding public verification key.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            inner: self.inner.verifying_key(),
        }
    }
}

/// Long-term Ed25519 verification key for the expected peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifyingKey {
    inner: ed25519_dalek::VerifyingKey,
}

impl VerifyingKey {
    /// Create from a raw 32-byte public key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPublicKey`] if the bytes are not a
    /// valid Ed25519 point.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let inner = ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self { inner })
    }

    pub(crate) fn from_dalek(inner: ed25519_dalek::VerifyingKey) -> Self {
        Self { inner }
    }

    /// Verify a signature over a message.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::SignatureVerification`] if the signature
    /// does not authenticate the message under this key.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
        self.inner
            .verify(message, &signature.to_dalek())
            .map_err(|_| CryptoError::SignatureVerification)
    }
}
