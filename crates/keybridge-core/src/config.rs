//! Proxy configuration.
//!
//! All options arrive from the launcher (CLI flags); nothing is read
//! from config files or the environment. The struct is immutable after
//! validation and shared read-only by every session.

use std::path::PathBuf;

use crate::error::ConfigError;

/// Immutable configuration for one proxy process.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// TCP port to listen on for inbound ECDHE connections.
    pub local_port: u16,
    /// PEM path: the proxy's long-term signing private key.
    pub private_key: PathBuf,
    /// PEM path: the peer's long-term public verification key or
    /// certificate.
    pub peer_public: PathBuf,
    /// Remote TLS host name or address.
    pub remote_host: String,
    /// Remote TLS port.
    pub remote_port: u16,
    /// Optional trust-anchor bundle; when absent the built-in roots are
    /// used.
    pub ca_path: Option<PathBuf>,
    /// Optional client TLS private key (mutual TLS).
    pub client_key: Option<PathBuf>,
    /// Optional client TLS certificate (mutual TLS).
    pub client_cert: Option<PathBuf>,
    /// Number of sessions to serve before exiting; zero or negative
    /// means unlimited.
    pub maxconn: i64,
}

impl ProxyConfig {
    /// Validate cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ClientAuthPair`] if exactly one of the
    /// client TLS key and certificate is configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_key.is_some() != self.client_cert.is_some() {
            return Err(ConfigError::ClientAuthPair);
        }
        Ok(())
    }

    /// The session limit, if one is configured.
    #[must_use]
    pub fn session_limit(&self) -> Option<u64> {
        u64::try_from(self.maxconn).ok().filter(|&n| n > 0)
    }
}
