//! # Keybridge Core
//!
//! Relay engine for the keybridge proxy. The proxy terminates a
//! mutually-authenticated ECDHE channel from a confidential-computing
//! workload that cannot speak TLS itself, terminates a verified TLS
//! client connection to a remote key server, and copies opaque payloads
//! between the two for the life of each session.
//!
//! This crate provides:
//! - Length-prefixed frame codec for the inbound wire protocol
//! - Signed-ECDHE handshake and session-key derivation
//! - Sealed-frame secure channel with per-direction nonce counters
//! - Verifying TLS 1.2+ client with optional mutual TLS
//! - Bidirectional relay loop and session supervision
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Supervisor                            │
//! │      (accept loop, one isolated session at a time)           │
//! ├──────────────────────────────────────────────────────────────┤
//! │   Handshake ──> SecureChannel          TLS client            │
//! │   (inbound, signed ECDHE)              (outbound, verified)  │
//! ├──────────────────────────────────────────────────────────────┤
//! │                        Relay loop                            │
//! │   (decrypt inbound -> TLS; TLS -> seal outbound)             │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod channel;
pub mod config;
pub mod error;
pub mod frame;
pub mod handshake;
pub mod relay;
pub mod supervisor;
pub mod tls;

pub use channel::SecureChannel;
pub use config::ProxyConfig;
pub use error::{ConfigError, FrameError, SessionError};
pub use supervisor::Supervisor;

/// Maximum size in bytes of a single frame body on the inbound channel.
///
/// A length prefix above this bound is rejected before any allocation
/// or body read. Must match the peer's compiled-in limit.
pub const MAX_FRAME_SIZE: usize = 16 * 1024;

/// Maximum plaintext relayed per sealed frame: the frame bound less the
/// AEAD authentication tag.
pub const MAX_PLAINTEXT_SIZE: usize = MAX_FRAME_SIZE - keybridge_crypto::TAG_SIZE;
