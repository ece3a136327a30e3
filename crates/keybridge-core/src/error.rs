//! Error types for the relay engine.
//!
//! Two scopes, reflecting the operator contract of a long-running
//! daemon: a [`SessionError`] is fatal to one session and returns
//! control to the supervisor's accept loop; a [`ConfigError`] is fatal
//! to the process at startup.

use std::path::PathBuf;

use keybridge_crypto::CryptoError;
use thiserror::Error;

use crate::MAX_FRAME_SIZE;

/// Framing-layer errors on the inbound channel
#[derive(Debug, Error)]
pub enum FrameError {
    /// The length prefix exceeds the compiled-in frame bound
    #[error("frame length {len} exceeds maximum {max}", max = MAX_FRAME_SIZE)]
    Oversize {
        /// The advertised length
        len: u64,
    },

    /// The peer closed the connection mid-frame
    #[error("connection closed mid-frame")]
    Truncated,

    /// Socket I/O failed
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Session-fatal errors. Any of these tears the session down; the
/// supervisor logs one line (kind and cause, never payload bytes) and
/// returns to accepting.
#[derive(Debug, Error)]
pub enum SessionError {
    /// I/O, framing, or protocol error during the ECDHE exchange
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Peer signature or sealed-frame authentication failure. Never
    /// retried; carries no payload detail.
    #[error("peer authentication failed")]
    Auth,

    /// The TLS verifier rejected the remote certificate chain
    #[error("certificate verification failed: {0}")]
    CertVerify(String),

    /// Read or write on the established TLS stream failed
    #[error("TLS connection error: {0}")]
    TlsIo(#[source] std::io::Error),

    /// Framing-layer failure on the inbound channel
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// A nonce counter would wrap
    #[error("nonce counter exhausted")]
    NonceExhausted,

    /// Forwarding an inbound payload to the key server failed with the
    /// payload already committed
    #[error("relay write to key server failed: {0}")]
    RelayWrite(#[source] std::io::Error),

    /// Reading from the key server failed mid-session
    #[error("relay read from key server failed: {0}")]
    RelayRead(#[source] std::io::Error),
}

impl From<CryptoError> for SessionError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::SignatureVerification | CryptoError::OpenFailed => Self::Auth,
            CryptoError::NonceExhausted => Self::NonceExhausted,
            other => Self::Handshake(other.to_string()),
        }
    }
}

/// Startup-fatal errors: the process exits non-zero without serving.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Long-term key material could not be loaded
    #[error("key loading failed: {0}")]
    KeyLoad(#[from] CryptoError),

    /// A TLS-related file (CA bundle, client key or cert) is unusable
    #[error("failed to load {} for TLS: {reason}", path.display())]
    TlsMaterial {
        /// Offending path
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Client key and certificate must be configured together
    #[error("client TLS key and certificate must both be set, or neither")]
    ClientAuthPair,

    /// The remote host string is not a valid TLS server name
    #[error("invalid remote host {host:?}: {reason}")]
    InvalidHost {
        /// The configured host
        host: String,
        /// What went wrong
        reason: String,
    },

    /// Building the TLS client configuration failed
    #[error("TLS configuration error: {0}")]
    Tls(#[from] rustls::Error),

    /// The local listen port could not be bound
    #[error("failed to bind local port {port}: {source}")]
    Bind {
        /// Configured listen port
        port: u16,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
