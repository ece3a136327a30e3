//! Length-prefixed frame codec for the inbound wire protocol.
//!
//! Every unit on the inbound channel, handshake blobs and sealed
//! records alike, is `<u64 length, big-endian><body>`. The length is
//! validated against [`MAX_FRAME_SIZE`](crate::MAX_FRAME_SIZE) before
//! any body allocation, so an absurd prefix cannot drive memory use.
//!
//! A clean close before the first byte of a new prefix is end-of-stream,
//! not an error; a close anywhere after that is [`FrameError::Truncated`].

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::FrameError;
use crate::MAX_FRAME_SIZE;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 8;

/// Read one frame.
///
/// Returns `Ok(None)` when the peer closed cleanly between frames.
/// Short reads are retried until the frame is complete.
///
/// # Errors
///
/// [`FrameError::Oversize`] for a prefix beyond the frame bound,
/// [`FrameError::Truncated`] for a close mid-prefix or mid-body, and
/// [`FrameError::Io`] for socket failures.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    let mut filled = 0;
    while filled < LENGTH_PREFIX_SIZE {
        let n = reader.read(&mut prefix[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(FrameError::Truncated);
        }
        filled += n;
    }

    let len = u64::from_be_bytes(prefix);
    if len > MAX_FRAME_SIZE as u64 {
        return Err(FrameError::Oversize { len });
    }

    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            FrameError::Truncated
        } else {
            FrameError::Io(e)
        }
    })?;

    Ok(Some(body))
}

/// Write one frame: length prefix, then body, retrying short writes.
///
/// # Errors
///
/// [`FrameError::Io`] on socket failure.
pub async fn write_frame<W>(writer: &mut W, body: &[u8]) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let prefix = (body.len() as u64).to_be_bytes();
    writer.write_all(&prefix).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn roundtrip(payload: &[u8]) {
        let (mut client, mut server) = tokio::io::duplex(2 * MAX_FRAME_SIZE);
        write_frame(&mut client, payload).await.unwrap();
        let received = read_frame(&mut server).await.unwrap().unwrap();
        assert_eq!(received, payload);
    }

    #[tokio::test]
    async fn roundtrip_empty() {
        roundtrip(b"").await;
    }

    #[tokio::test]
    async fn roundtrip_single_byte() {
        roundtrip(&[0xAB]).await;
    }

    #[tokio::test]
    async fn roundtrip_max_size() {
        roundtrip(&vec![0x5A; MAX_FRAME_SIZE]).await;
    }

    #[tokio::test]
    async fn oversize_prefix_rejected_before_body() {
        let (mut client, mut server) = tokio::io::duplex(64);
        // Prefix only: 2^40 bytes advertised, none sent. The reader must
        // reject on the prefix alone without waiting for a body.
        let advertised: u64 = 1 << 40;
        tokio::io::AsyncWriteExt::write_all(&mut client, &advertised.to_be_bytes())
            .await
            .unwrap();

        match read_frame(&mut server).await {
            Err(FrameError::Oversize { len }) => assert_eq!(len, advertised),
            other => panic!("expected Oversize, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn one_past_the_bound_is_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let advertised = (MAX_FRAME_SIZE as u64) + 1;
        tokio::io::AsyncWriteExt::write_all(&mut client, &advertised.to_be_bytes())
            .await
            .unwrap();
        assert!(matches!(
            read_frame(&mut server).await,
            Err(FrameError::Oversize { .. })
        ));
    }

    #[tokio::test]
    async fn clean_close_between_frames_is_end_of_stream() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);
        assert!(read_frame(&mut server).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn close_mid_prefix_is_truncated() {
        let (mut client, mut server) = tokio::io::duplex(64);
        tokio::io::AsyncWriteExt::write_all(&mut client, &[0u8; 3])
            .await
            .unwrap();
        drop(client);
        assert!(matches!(
            read_frame(&mut server).await,
            Err(FrameError::Truncated)
        ));
    }

    #[tokio::test]
    async fn close_mid_body_is_truncated() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let prefix = 10u64.to_be_bytes();
        tokio::io::AsyncWriteExt::write_all(&mut client, &prefix)
            .await
            .unwrap();
        tokio::io::AsyncWriteExt::write_all(&mut client, &[1, 2, 3])
            .await
            .unwrap();
        drop(client);
        assert!(matches!(
            read_frame(&mut server).await,
            Err(FrameError::Truncated)
        ));
    }

    #[tokio::test]
    async fn frames_preserve_order() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        write_frame(&mut client, b"first").await.unwrap();
        write_frame(&mut client, b"second").await.unwrap();
        assert_eq!(read_frame(&mut server).await.unwrap().unwrap(), b"first");
        assert_eq!(read_frame(&mut server).await.unwrap().unwrap(), b"second");
    }
}
