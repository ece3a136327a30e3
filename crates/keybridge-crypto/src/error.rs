//! Cryptographic error types.

use std::path::PathBuf;
use thiserror::Error;

/// Cryptographic errors
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A key file could not be read
    #[error("failed to read key file {}: {source}", path.display())]
    KeyFileRead {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Key material in a file could not be parsed
    #[error("failed to parse key material in {}", path.display())]
    KeyParse {
        /// Path that was being parsed
        path: PathBuf,
    },

    /// The bytes are not a valid public key point
    #[error("invalid public key")]
    InvalidPublicKey,

    /// A signature blob is malformed (wrong length or encoding)
    #[error("malformed signature")]
    InvalidSignature,

    /// Signature verification failed
    #[error("signature verification failed")]
    SignatureVerification,

    /// The ECDH computation produced a low-order result
    #[error("key agreement produced a weak shared secret")]
    WeakSharedSecret,

    /// AEAD sealing failed
    #[error("sealing failed")]
    SealFailed,

    /// AEAD opening failed (authentication failure)
    #[error("opening failed: authentication failure")]
    OpenFailed,

    /// A nonce counter would wrap
    #[error("nonce counter exhausted")]
    NonceExhausted,
}
