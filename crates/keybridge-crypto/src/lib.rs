//! # Keybridge Crypto
//!
//! Cryptographic primitives for the keybridge relay proxy.
//!
//! This crate provides:
//! - Ephemeral X25519 key agreement for the inbound handshake
//! - Ed25519 signing and verification of handshake contributions
//! - Long-term key loading from PEM files
//! - HKDF-BLAKE3 session-key derivation with transcript binding
//! - `ChaCha20-Poly1305` frame sealing with direction-tagged counter nonces
//!
//! ## Cryptographic Suite
//!
//! | Function | Algorithm |
//! |----------|-----------|
//! | Key Exchange | X25519 (ephemeral per session) |
//! | Signatures | Ed25519 |
//! | KDF | HKDF-BLAKE3 |
//! | AEAD | ChaCha20-Poly1305 (96-bit nonce) |
//!
//! All private key material, shared secrets, and session keys are
//! zeroized on drop.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod aead;
pub mod ecdh;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod sign;

pub use aead::{Direction, SessionKey};
pub use ecdh::{Contribution, EphemeralKeypair, SharedSecret};
pub use error::CryptoError;
pub use keys::LongTermKeys;
pub use sign::{Signature, SigningKey, VerifyingKey};

/// X25519 public contribution size in bytes
pub const CONTRIBUTION_SIZE: usize = 32;

/// Ed25519 signature size in bytes
pub const SIGNATURE_SIZE: usize = 64;

/// AEAD session key size in bytes
pub const SESSION_KEY_SIZE: usize = 32;

/// AEAD nonce size in bytes (4-byte direction tag + 8-byte counter)
pub const NONCE_SIZE: usize = 12;

/// AEAD authentication tag size in bytes
pub const TAG_SIZE: usize = 16;
