//! Accept loop and session lifecycle.
//!
//! The supervisor owns everything that outlives a session: the
//! listener, the long-term keys, and the prebuilt TLS client
//! configuration. Each accepted connection becomes one session
//! (handshake, TLS dial, relay) run to completion with exclusive
//! ownership of its socket pair, session key, and counters. A session-fatal
//! error tears that session down and the loop keeps accepting; only
//! startup problems are fatal to the process.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info};

use keybridge_crypto::LongTermKeys;

use crate::channel::SecureChannel;
use crate::config::ProxyConfig;
use crate::error::{ConfigError, SessionError};
use crate::tls::TlsTarget;
use crate::{handshake, relay};

/// The long-lived proxy service.
pub struct Supervisor {
    listener: TcpListener,
    keys: LongTermKeys,
    tls: TlsTarget,
    session_limit: Option<u64>,
}

impl Supervisor {
    /// Load keys, build the TLS client configuration, and bind the
    /// local port.
    ///
    /// # Errors
    ///
    /// All failures here are startup-fatal [`ConfigError`]s.
    pub async fn bind(config: &ProxyConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let keys = LongTermKeys::load(&config.private_key, &config.peer_public)?;
        let tls = TlsTarget::from_config(config)?;

        let listener = TcpListener::bind(("0.0.0.0", config.local_port))
            .await
            .map_err(|source| ConfigError::Bind {
                port: config.local_port,
                source,
            })?;
        info!(port = config.local_port, "listening for inbound connections");

        Ok(Self {
            listener,
            keys,
            tls,
            session_limit: config.session_limit(),
        })
    }

    /// The bound listen address (useful when the configured port is 0).
    ///
    /// # Errors
    ///
    /// Propagates the socket's address lookup failure.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve sessions until the configured session limit is reached.
    ///
    /// Sessions run one at a time; a session-fatal error is logged by
    /// kind and cause and the loop returns to accepting. Runs forever
    /// when no limit is configured.
    pub async fn run(self) {
        let mut completed: u64 = 0;

        loop {
            let (socket, peer_addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    error!(error = %err, "accept failed");
                    continue;
                }
            };
            info!(%peer_addr, "inbound connection accepted");

            match serve_session(socket, &self.keys, &self.tls).await {
                Ok(()) => info!(%peer_addr, "session completed"),
                Err(err) => error!(%peer_addr, error = %err, "session terminated"),
            }

            completed += 1;
            if let Some(limit) = self.session_limit {
                if completed >= limit {
                    info!(sessions = completed, "session limit reached, shutting down");
                    return;
                }
            }
        }
    }
}

/// One complete session: inbound handshake, outbound TLS dial, relay.
///
/// Teardown is guaranteed on every path: the relay closes the TLS side
/// with a best-effort close-notify, sockets close on drop, and the
/// session key and ephemeral material are zeroized by drop. The
/// long-term keys are untouched for the next session.
async fn serve_session(
    mut socket: TcpStream,
    keys: &LongTermKeys,
    tls: &TlsTarget,
) -> Result<(), SessionError> {
    let session_key = handshake::respond(&mut socket, keys).await?;
    info!("inbound handshake complete");

    let tls_stream = tls.connect().await?;
    info!("TLS connection to key server established");

    let channel = SecureChannel::responder(socket, session_key);
    relay::run(channel, tls_stream).await
}
