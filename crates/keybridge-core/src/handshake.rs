//! Signed-ECDHE handshake on a freshly accepted inbound socket.
//!
//! Both peers generate an ephemeral X25519 keypair, sign the public
//! contribution with their long-term Ed25519 key, and exchange
//! contribution and signature as two length-prefixed frames each. The
//! proxy is the responder: it reads the peer's pair first, verifies the
//! signature under the pre-provisioned peer key, and only then sends
//! its own. The session key is derived from the shared secret with both
//! contributions bound into the derivation, and both direction counters
//! start at zero.
//!
//! A signature that does not verify terminates the exchange
//! immediately; nothing further is read from or written to the socket,
//! and no key material survives.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use keybridge_crypto::{
    kdf, Contribution, EphemeralKeypair, LongTermKeys, SessionKey, Signature, SigningKey,
    VerifyingKey,
};

use crate::error::SessionError;
use crate::frame::{read_frame, write_frame};

/// Run the responder side of the handshake (the proxy's role).
///
/// On success the returned [`SessionKey`] is the only key material
/// retained; the ephemeral private half has already been consumed.
///
/// # Errors
///
/// [`SessionError::Auth`] if the peer's signature does not verify;
/// [`SessionError::Handshake`] for I/O, framing, or malformed blobs.
pub async fn respond<S>(stream: &mut S, keys: &LongTermKeys) -> Result<SessionKey, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let ephemeral = EphemeralKeypair::generate();
    let local_contribution = ephemeral.contribution();

    // The peer transmits first; read its contribution and signature
    // before revealing ours.
    let peer_contribution = expect_blob(stream, "peer contribution").await?;
    let peer_contribution = Contribution::from_slice(&peer_contribution)?;
    let peer_signature = expect_blob(stream, "peer signature").await?;
    let peer_signature = Signature::from_slice(&peer_signature)?;

    keys.peer
        .verify(peer_contribution.as_bytes(), &peer_signature)?;
    debug!("peer contribution signature verified");

    write_frame(stream, local_contribution.as_bytes()).await?;
    let local_signature = keys.signing.sign(local_contribution.as_bytes());
    write_frame(stream, local_signature.as_bytes()).await?;

    let shared = ephemeral.agree(&peer_contribution)?;
    Ok(kdf::derive_session_key(
        &shared,
        &peer_contribution,
        &local_contribution,
    ))
}

/// Run the initiator side of the handshake (the peer workload's role).
///
/// Sends the local contribution and signature first, then reads and
/// verifies the responder's under `responder_key`. Provided for
/// workloads and harnesses driving the proxy's inbound protocol.
///
/// # Errors
///
/// [`SessionError::Auth`] if the responder's signature does not verify;
/// [`SessionError::Handshake`] for I/O, framing, or malformed blobs.
pub async fn initiate<S>(
    stream: &mut S,
    signing: &SigningKey,
    responder_key: &VerifyingKey,
) -> Result<SessionKey, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let ephemeral = EphemeralKeypair::generate();
    let local_contribution = ephemeral.contribution();

    write_frame(stream, local_contribution.as_bytes()).await?;
    let local_signature = signing.sign(local_contribution.as_bytes());
    write_frame(stream, local_signature.as_bytes()).await?;

    let peer_contribution = expect_blob(stream, "responder contribution").await?;
    let peer_contribution = Contribution::from_slice(&peer_contribution)?;
    let peer_signature = expect_blob(stream, "responder signature").await?;
    let peer_signature = Signature::from_slice(&peer_signature)?;

    responder_key.verify(peer_contribution.as_bytes(), &peer_signature)?;

    let shared = ephemeral.agree(&peer_contribution)?;
    Ok(kdf::derive_session_key(
        &shared,
        &local_contribution,
        &peer_contribution,
    ))
}

async fn expect_blob<S>(stream: &mut S, what: &str) -> Result<Vec<u8>, SessionError>
where
    S: AsyncRead + Unpin,
{
    match read_frame(stream).await? {
        Some(blob) => Ok(blob),
        None => Err(SessionError::Handshake(format!(
            "connection closed while waiting for {what}"
        ))),
    }
}
