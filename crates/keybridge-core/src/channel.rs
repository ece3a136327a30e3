//! Post-handshake secure channel.
//!
//! Wraps the inbound socket once a session key exists. Every payload
//! travels as one sealed frame; the nonce for each frame is the sealing
//! direction's tag plus that direction's counter, and the counters only
//! ever move forward. A counter that would wrap terminates the session
//! rather than reuse a nonce, and a frame that fails to open terminates
//! it rather than resynchronize.

use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};

use keybridge_crypto::{Direction, SessionKey};

use crate::error::{FrameError, SessionError};
use crate::frame::{read_frame, write_frame};
use crate::MAX_PLAINTEXT_SIZE;

async fn send_sealed<W>(
    writer: &mut W,
    key: &SessionKey,
    direction: Direction,
    counter: &mut u64,
    plaintext: &[u8],
) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin,
{
    if plaintext.len() > MAX_PLAINTEXT_SIZE {
        return Err(SessionError::Frame(FrameError::Oversize {
            len: plaintext.len() as u64,
        }));
    }
    if *counter == u64::MAX {
        return Err(SessionError::NonceExhausted);
    }

    let sealed = key.seal(direction, *counter, plaintext)?;
    write_frame(writer, &sealed).await?;
    *counter += 1;
    Ok(())
}

async fn recv_sealed<R>(
    reader: &mut R,
    key: &SessionKey,
    direction: Direction,
    counter: &mut u64,
) -> Result<Option<Vec<u8>>, SessionError>
where
    R: AsyncRead + Unpin,
{
    let Some(sealed) = read_frame(reader).await? else {
        return Ok(None);
    };
    if *counter == u64::MAX {
        return Err(SessionError::NonceExhausted);
    }

    let plaintext = key.open(direction, *counter, &sealed)?;
    *counter += 1;
    Ok(Some(plaintext))
}

/// An authenticated, sealed connection to the peer.
///
/// Owns the socket, the session key, and both nonce counters. Nothing
/// else can touch the counters, so a (key, direction, counter) triple
/// is never reused.
pub struct SecureChannel<S> {
    stream: S,
    key: SessionKey,
    send_direction: Direction,
    send_counter: u64,
    recv_counter: u64,
}

impl<S> SecureChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a socket as the responder (the proxy's role).
    #[must_use]
    pub fn responder(stream: S, key: SessionKey) -> Self {
        Self::new(stream, key, Direction::ResponderToInitiator)
    }

    /// Wrap a socket as the initiator (the peer workload's role).
    #[must_use]
    pub fn initiator(stream: S, key: SessionKey) -> Self {
        Self::new(stream, key, Direction::InitiatorToResponder)
    }

    fn new(stream: S, key: SessionKey, send_direction: Direction) -> Self {
        Self {
            stream,
            key,
            send_direction,
            send_counter: 0,
            recv_counter: 0,
        }
    }

    /// Seal a payload and write it as one frame.
    ///
    /// # Errors
    ///
    /// [`SessionError::NonceExhausted`] when the send counter would
    /// wrap, [`SessionError::Frame`] for oversize payloads and socket
    /// failures.
    pub async fn send(&mut self, plaintext: &[u8]) -> Result<(), SessionError> {
        send_sealed(
            &mut self.stream,
            &self.key,
            self.send_direction,
            &mut self.send_counter,
            plaintext,
        )
        .await
    }

    /// Read one frame and open it.
    ///
    /// Returns `Ok(None)` when the peer closed cleanly between frames.
    ///
    /// # Errors
    ///
    /// [`SessionError::Auth`] when the frame fails to open. Always
    /// fatal, never retried.
    pub async fn recv(&mut self) -> Result<Option<Vec<u8>>, SessionError> {
        recv_sealed(
            &mut self.stream,
            &self.key,
            self.send_direction.reverse(),
            &mut self.recv_counter,
        )
        .await
    }

    /// Split into independently owned receive and send halves so the
    /// two relay directions can make progress concurrently.
    #[must_use]
    pub fn split(self) -> (SecureReceiver<ReadHalf<S>>, SecureSender<WriteHalf<S>>) {
        let (reader, writer) = tokio::io::split(self.stream);
        let receiver = SecureReceiver {
            reader,
            key: self.key.clone(),
            direction: self.send_direction.reverse(),
            counter: self.recv_counter,
        };
        let sender = SecureSender {
            writer,
            key: self.key,
            direction: self.send_direction,
            counter: self.send_counter,
        };
        (receiver, sender)
    }
}

/// Receiving half of a split [`SecureChannel`].
pub struct SecureReceiver<R> {
    reader: R,
    key: SessionKey,
    direction: Direction,
    counter: u64,
}

impl<R> SecureReceiver<R>
where
    R: AsyncRead + Unpin,
{
    /// Read one frame and open it; `Ok(None)` on clean peer close.
    ///
    /// # Errors
    ///
    /// As [`SecureChannel::recv`].
    pub async fn recv(&mut self) -> Result<Option<Vec<u8>>, SessionError> {
        recv_sealed(&mut self.reader, &self.key, self.direction, &mut self.counter).await
    }
}

/// Sending half of a split [`SecureChannel`].
pub struct SecureSender<W> {
    writer: W,
    key: SessionKey,
    direction: Direction,
    counter: u64,
}

impl<W> SecureSender<W>
where
    W: AsyncWrite + Unpin,
{
    /// Seal a payload and write it as one frame.
    ///
    /// # Errors
    ///
    /// As [`SecureChannel::send`].
    pub async fn send(&mut self, plaintext: &[u8]) -> Result<(), SessionError> {
        send_sealed(&mut self.writer, &self.key, self.direction, &mut self.counter, plaintext)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame;
    use keybridge_crypto::SESSION_KEY_SIZE;
    use tokio::io::DuplexStream;

    fn channel_pair() -> (SecureChannel<DuplexStream>, SecureChannel<DuplexStream>) {
        let key = SessionKey::new([0x24; SESSION_KEY_SIZE]);
        let (initiator_io, responder_io) = tokio::io::duplex(4 * crate::MAX_FRAME_SIZE);
        (
            SecureChannel::initiator(initiator_io, key.clone()),
            SecureChannel::responder(responder_io, key),
        )
    }

    #[tokio::test]
    async fn bidirectional_roundtrip() {
        let (mut initiator, mut responder) = channel_pair();

        initiator.send(b"hello").await.unwrap();
        assert_eq!(responder.recv().await.unwrap().unwrap(), b"hello");

        responder.send(b"world").await.unwrap();
        assert_eq!(initiator.recv().await.unwrap().unwrap(), b"world");
    }

    #[tokio::test]
    async fn counters_advance_per_frame() {
        let (mut initiator, mut responder) = channel_pair();

        for i in 0..5u8 {
            initiator.send(&[i]).await.unwrap();
        }
        for i in 0..5u8 {
            assert_eq!(responder.recv().await.unwrap().unwrap(), &[i]);
        }
        assert_eq!(initiator.send_counter, 5);
        assert_eq!(responder.recv_counter, 5);
    }

    #[tokio::test]
    async fn max_plaintext_roundtrips() {
        let (mut initiator, mut responder) = channel_pair();
        let payload = vec![0x77; MAX_PLAINTEXT_SIZE];
        initiator.send(&payload).await.unwrap();
        assert_eq!(responder.recv().await.unwrap().unwrap(), payload);
    }

    #[tokio::test]
    async fn over_limit_payload_is_rejected() {
        let (mut initiator, _responder) = channel_pair();
        let payload = vec![0u8; MAX_PLAINTEXT_SIZE + 1];
        assert!(matches!(
            initiator.send(&payload).await,
            Err(SessionError::Frame(FrameError::Oversize { .. }))
        ));
    }

    #[tokio::test]
    async fn tampered_frame_is_an_auth_failure() {
        let key = SessionKey::new([0x24; SESSION_KEY_SIZE]);
        let (mut attacker_io, responder_io) = tokio::io::duplex(4096);
        let mut responder = SecureChannel::responder(responder_io, key.clone());

        let mut sealed = key
            .seal(keybridge_crypto::Direction::InitiatorToResponder, 0, b"hello")
            .unwrap();
        sealed[2] ^= 0x01;
        frame::write_frame(&mut attacker_io, &sealed).await.unwrap();

        assert!(matches!(
            responder.recv().await,
            Err(SessionError::Auth)
        ));
    }

    #[tokio::test]
    async fn replayed_frame_is_an_auth_failure() {
        let key = SessionKey::new([0x24; SESSION_KEY_SIZE]);
        let (mut attacker_io, responder_io) = tokio::io::duplex(4096);
        let mut responder = SecureChannel::responder(responder_io, key.clone());

        let sealed = key
            .seal(keybridge_crypto::Direction::InitiatorToResponder, 0, b"hello")
            .unwrap();
        frame::write_frame(&mut attacker_io, &sealed).await.unwrap();
        frame::write_frame(&mut attacker_io, &sealed).await.unwrap();

        assert_eq!(responder.recv().await.unwrap().unwrap(), b"hello");
        // The replay arrives under an advanced receive counter and no
        // longer opens.
        assert!(matches!(responder.recv().await, Err(SessionError::Auth)));
    }

    #[tokio::test]
    async fn reflected_frame_is_an_auth_failure() {
        let key = SessionKey::new([0x24; SESSION_KEY_SIZE]);
        let (mut attacker_io, initiator_io) = tokio::io::duplex(4096);
        let mut initiator = SecureChannel::initiator(initiator_io, key.clone());

        // A frame the initiator itself sealed, played back at it.
        let sealed = key
            .seal(keybridge_crypto::Direction::InitiatorToResponder, 0, b"hello")
            .unwrap();
        frame::write_frame(&mut attacker_io, &sealed).await.unwrap();

        assert!(matches!(initiator.recv().await, Err(SessionError::Auth)));
    }

    #[tokio::test]
    async fn send_counter_exhaustion_terminates() {
        let (mut initiator, _responder) = channel_pair();
        initiator.send_counter = u64::MAX;
        assert!(matches!(
            initiator.send(b"payload").await,
            Err(SessionError::NonceExhausted)
        ));
    }

    #[tokio::test]
    async fn recv_counter_exhaustion_terminates() {
        let (mut initiator, mut responder) = channel_pair();
        initiator.send(b"payload").await.unwrap();
        responder.recv_counter = u64::MAX;
        assert!(matches!(
            responder.recv().await,
            Err(SessionError::NonceExhausted)
        ));
    }

    #[tokio::test]
    async fn clean_close_is_end_of_stream() {
        let (initiator, mut responder) = channel_pair();
        drop(initiator);
        assert!(responder.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn split_halves_continue_the_counters() {
        let (mut initiator, responder) = channel_pair();
        initiator.send(b"before split").await.unwrap();

        let (mut rx, mut tx) = responder.split();
        assert_eq!(rx.recv().await.unwrap().unwrap(), b"before split");

        tx.send(b"from the split half").await.unwrap();
        assert_eq!(
            initiator.recv().await.unwrap().unwrap(),
            b"from the split half"
        );
    }
}
