//! Bidirectional relay between the secure inbound channel and the
//! outbound TLS stream.
//!
//! Both directions run as one cooperative task. Each direction performs
//! one bounded read, forwards it, and blocks again; there is no
//! internal queue, so a fast producer is backpressured by the slow
//! side. The loop ends at the first clean close or session-fatal error
//! on either side, and teardown always runs: a best-effort close toward
//! the key server, sockets closed on drop, key material zeroized by
//! drop, and any lingering plaintext buffer cleared.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};
use zeroize::Zeroize;

use crate::channel::{SecureChannel, SecureReceiver, SecureSender};
use crate::error::SessionError;
use crate::MAX_PLAINTEXT_SIZE;

/// Relay payloads in both directions until one side closes cleanly or a
/// session-fatal error occurs, then tear the connection pair down.
///
/// The inbound direction is polled first on every wakeup.
///
/// # Errors
///
/// Any [`SessionError`] from either direction; the teardown has already
/// run when this returns.
pub async fn run<S, T>(channel: SecureChannel<S>, outbound: T) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    T: AsyncRead + AsyncWrite + Unpin,
{
    let (mut inbound_rx, mut inbound_tx) = channel.split();
    let (mut outbound_rx, mut outbound_tx) = tokio::io::split(outbound);

    let result = {
        tokio::select! {
            biased;
            r = pump_inbound(&mut inbound_rx, &mut outbound_tx) => r,
            r = pump_outbound(&mut outbound_rx, &mut inbound_tx) => r,
        }
    };

    // Close-notify toward the key server is best-effort; the inbound
    // socket closes when its halves drop.
    let _ = outbound_tx.shutdown().await;

    result
}

/// Inbound direction: open sealed frames from the peer and forward the
/// plaintext to the key server.
async fn pump_inbound<R, W>(
    inbound: &mut SecureReceiver<R>,
    outbound: &mut W,
) -> Result<(), SessionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    while let Some(mut plaintext) = inbound.recv().await? {
        // The frame is already consumed from the peer, so a failed or
        // short write here cannot be retried safely.
        outbound
            .write_all(&plaintext)
            .await
            .map_err(SessionError::RelayWrite)?;
        outbound.flush().await.map_err(SessionError::RelayWrite)?;
        debug!(bytes = plaintext.len(), "relayed inbound payload to key server");
        plaintext.zeroize();
    }
    info!("inbound peer closed the channel");
    Ok(())
}

/// Outbound direction: read from the key server in bounded chunks and
/// seal each one back to the peer.
async fn pump_outbound<R, W>(
    outbound: &mut R,
    inbound: &mut SecureSender<W>,
) -> Result<(), SessionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; MAX_PLAINTEXT_SIZE];
    loop {
        let n = outbound.read(&mut buf).await.map_err(SessionError::RelayRead)?;
        if n == 0 {
            info!("key server closed the connection");
            break;
        }
        inbound.send(&buf[..n]).await?;
        debug!(bytes = n, "relayed key server payload to inbound peer");
        buf[..n].zeroize();
    }
    buf.zeroize();
    Ok(())
}
