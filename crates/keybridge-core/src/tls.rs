//! Verifying TLS client for the outbound leg.
//!
//! The remote key server is always authenticated: TLS 1.2 is the floor,
//! peer certificate verification is mandatory, and both SNI and
//! hostname verification bind to the configured host string. Trust
//! anchors come from the configured CA bundle exclusively when one is
//! given, otherwise from the built-in root set. A client key and
//! certificate, when configured, are presented for mutual TLS.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use rustls::{ClientConfig, RootCertStore};
use tokio::net::TcpStream;
use tokio_rustls::{client::TlsStream, TlsConnector};
use tracing::debug;

use crate::config::ProxyConfig;
use crate::error::{ConfigError, SessionError};

/// The outbound TLS endpoint, with its verified-client configuration
/// built once at startup and reused by every session.
pub struct TlsTarget {
    connector: TlsConnector,
    host: String,
    port: u16,
    server_name: ServerName<'static>,
}

impl TlsTarget {
    /// Build the TLS client configuration from the proxy options.
    ///
    /// # Errors
    ///
    /// Startup-fatal: unreadable or unparsable CA bundle, client key,
    /// or client certificate; a remote host that is not a valid server
    /// name; or a rustls configuration rejection.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ConfigError> {
        let roots = load_trust_anchors(config.ca_path.as_deref())?;

        let builder = ClientConfig::builder_with_protocol_versions(&[
            &rustls::version::TLS13,
            &rustls::version::TLS12,
        ])
        .with_root_certificates(roots);

        let client_config = match (&config.client_key, &config.client_cert) {
            (Some(key_path), Some(cert_path)) => {
                let certs = load_cert_chain(cert_path)?;
                let key = load_private_key(key_path)?;
                builder.with_client_auth_cert(certs, key)?
            }
            _ => builder.with_no_client_auth(),
        };

        let server_name = ServerName::try_from(config.remote_host.clone()).map_err(|e| {
            ConfigError::InvalidHost {
                host: config.remote_host.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            connector: TlsConnector::from(Arc::new(client_config)),
            host: config.remote_host.clone(),
            port: config.remote_port,
            server_name,
        })
    }

    /// Connect and complete the TLS handshake with the key server.
    ///
    /// # Errors
    ///
    /// [`SessionError::CertVerify`] when the verifier rejects the
    /// chain (with the verifier's reason), [`SessionError::TlsIo`] for
    /// everything else. No application bytes are sent on failure.
    pub async fn connect(&self) -> Result<TlsStream<TcpStream>, SessionError> {
        let tcp = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(SessionError::TlsIo)?;
        debug!(host = %self.host, port = self.port, "TCP connected, starting TLS handshake");

        self.connector
            .connect(self.server_name.clone(), tcp)
            .await
            .map_err(classify_handshake_error)
    }
}

/// The TLS handshake surfaces verifier rejections as I/O errors
/// wrapping a `rustls::Error`; pull those apart so certificate problems
/// stay distinguishable from plain socket failures.
fn classify_handshake_error(err: std::io::Error) -> SessionError {
    if let Some(inner) = err.get_ref() {
        if let Some(rustls::Error::InvalidCertificate(reason)) =
            inner.downcast_ref::<rustls::Error>()
        {
            return SessionError::CertVerify(format!("{reason:?}"));
        }
    }
    SessionError::TlsIo(err)
}

fn load_trust_anchors(ca_path: Option<&Path>) -> Result<RootCertStore, ConfigError> {
    let mut roots = RootCertStore::empty();

    match ca_path {
        Some(path) => {
            for cert in load_cert_chain(path)? {
                roots.add(cert).map_err(|e| tls_material(path, e))?;
            }
            if roots.is_empty() {
                return Err(tls_material(path, "no certificates found"));
            }
        }
        None => {
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }
    }

    Ok(roots)
}

fn load_cert_chain(path: &Path) -> Result<Vec<CertificateDer<'static>>, ConfigError> {
    let file = File::open(path).map_err(|e| tls_material(path, e))?;
    let mut reader = BufReader::new(file);

    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| tls_material(path, e))?;

    if certs.is_empty() {
        return Err(tls_material(path, "no certificates found"));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, ConfigError> {
    let file = File::open(path).map_err(|e| tls_material(path, e))?;
    let mut reader = BufReader::new(file);

    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| tls_material(path, e))?
        .ok_or_else(|| tls_material(path, "no private key found"))
}

fn tls_material(path: &Path, reason: impl ToString) -> ConfigError {
    ConfigError::TlsMaterial {
        path: PathBuf::from(path),
        reason: reason.to_string(),
    }
}
