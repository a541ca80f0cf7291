//! Wire frames and their codec.
//!
//! ```text
//! [4 bytes: total length L = 1 + payload_len, big-endian]
//! [1 byte : frame kind]
//! [L-1 bytes: payload]
//! ```
//!
//! A declared length of zero or above the limit is a protocol violation;
//! the reader treats it like a lost connection.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::FrameError;

/// Size of the length prefix.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Largest accepted value of the length field (10 MiB).
pub const MAX_FRAME_LEN: u32 = 10 * 1024 * 1024;

/// Reserved frame kinds.
pub mod kinds {
    /// Greeting, payload is free-form.
    pub const HELLO: u8 = 1;
    /// Acknowledgement.
    pub const ACK: u8 = 2;
    /// Liveness probe.
    pub const PING: u8 = 3;
    /// Reply to a ping.
    pub const PONG: u8 = 4;
    /// A binary-encoded document op.
    pub const OP: u8 = 5;
}

/// Interpretation of a frame's kind byte.
///
/// Unknown kinds are carried as [`FrameKind::Other`]; they are never an
/// error at the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Hello,
    Ack,
    Ping,
    Pong,
    Op,
    Other(u8),
}

impl From<u8> for FrameKind {
    fn from(value: u8) -> Self {
        match value {
            kinds::HELLO => FrameKind::Hello,
            kinds::ACK => FrameKind::Ack,
            kinds::PING => FrameKind::Ping,
            kinds::PONG => FrameKind::Pong,
            kinds::OP => FrameKind::Op,
            other => FrameKind::Other(other),
        }
    }
}

impl From<FrameKind> for u8 {
    fn from(kind: FrameKind) -> Self {
        match kind {
            FrameKind::Hello => kinds::HELLO,
            FrameKind::Ack => kinds::ACK,
            FrameKind::Ping => kinds::PING,
            FrameKind::Pong => kinds::PONG,
            FrameKind::Op => kinds::OP,
            FrameKind::Other(other) => other,
        }
    }
}

/// One typed message exchanged over the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw kind byte.
    pub kind: u8,
    /// Payload bytes.
    pub payload: Bytes,
}

impl Frame {
    /// Create a frame.
    pub fn new(kind: impl Into<u8>, payload: impl Into<Bytes>) -> Self {
        Self {
            kind: kind.into(),
            payload: payload.into(),
        }
    }

    pub fn hello(payload: impl Into<Bytes>) -> Self {
        Self::new(kinds::HELLO, payload)
    }

    pub fn ack(payload: impl Into<Bytes>) -> Self {
        Self::new(kinds::ACK, payload)
    }

    pub fn ping() -> Self {
        Self::new(kinds::PING, Bytes::from_static(b"ping"))
    }

    pub fn pong() -> Self {
        Self::new(kinds::PONG, Bytes::from_static(b"pong"))
    }

    pub fn op(payload: impl Into<Bytes>) -> Self {
        Self::new(kinds::OP, payload)
    }

    /// The interpreted kind.
    pub fn frame_kind(&self) -> FrameKind {
        FrameKind::from(self.kind)
    }

    /// Value of the length field for this frame.
    pub fn wire_len(&self) -> usize {
        1 + self.payload.len()
    }
}

fn check_declared(len: u32, max_len: u32) -> Result<(), FrameError> {
    if len == 0 {
        return Err(FrameError::ZeroLength);
    }
    if len > max_len {
        return Err(FrameError::TooLarge {
            max: max_len,
            got: len,
        });
    }
    Ok(())
}

/// Encode a frame into a single contiguous buffer.
pub fn encode_frame(frame: &Frame, max_len: u32) -> Result<BytesMut, FrameError> {
    let wire_len = frame.wire_len();
    let len = u32::try_from(wire_len)
        .ok()
        .filter(|&len| len <= max_len)
        .ok_or(FrameError::PayloadTooLarge {
            max: max_len,
            got: frame.payload.len(),
        })?;

    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_LEN + wire_len);
    buf.put_u32(len);
    buf.put_u8(frame.kind);
    buf.put_slice(&frame.payload);
    Ok(buf)
}

/// Decode one frame from the front of `buf`, if a whole frame is present.
///
/// Consumed bytes are removed from `buf`. Returns `Ok(None)` when more
/// input is needed.
pub fn decode_frame(buf: &mut BytesMut, max_len: u32) -> Result<Option<Frame>, FrameError> {
    if buf.len() < LENGTH_PREFIX_LEN {
        return Ok(None);
    }
    let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    check_declared(len, max_len)?;

    let total = LENGTH_PREFIX_LEN + len as usize;
    if buf.len() < total {
        buf.reserve(total - buf.len());
        return Ok(None);
    }

    buf.advance(LENGTH_PREFIX_LEN);
    let kind = buf.get_u8();
    let payload = buf.split_to(len as usize - 1).freeze();
    Ok(Some(Frame { kind, payload }))
}

/// Read exactly one frame.
///
/// Returns `Ok(None)` if the stream ends cleanly on a frame boundary.
pub async fn read_frame<R>(reader: &mut R, max_len: u32) -> Result<Option<Frame>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; LENGTH_PREFIX_LEN];
    let mut filled = 0;
    while filled < header.len() {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "frame header truncated",
            )
            .into());
        }
        filled += n;
    }

    let len = u32::from_be_bytes(header);
    check_declared(len, max_len)?;

    let kind = reader.read_u8().await?;
    let mut payload = vec![0u8; len as usize - 1];
    reader.read_exact(&mut payload).await?;

    Ok(Some(Frame {
        kind,
        payload: Bytes::from(payload),
    }))
}

/// Write one frame with a single buffered write.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame, max_len: u32) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let buf = encode_frame(frame, max_len)?;
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_layout() {
        let buf = encode_frame(&Frame::ping(), MAX_FRAME_LEN).unwrap();
        assert_eq!(&buf[..], &[0, 0, 0, 5, kinds::PING, b'p', b'i', b'n', b'g']);
    }

    #[test]
    fn test_empty_payload() {
        let frame = Frame::new(200u8, Bytes::new());
        let mut buf = encode_frame(&frame, MAX_FRAME_LEN).unwrap();
        assert_eq!(&buf[..], &[0, 0, 0, 1, 200]);
        assert_eq!(decode_frame(&mut buf, MAX_FRAME_LEN).unwrap(), Some(frame));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_kind_mapping() {
        for raw in 0..=255u8 {
            assert_eq!(u8::from(FrameKind::from(raw)), raw);
        }
        assert_eq!(Frame::op(Bytes::new()).frame_kind(), FrameKind::Op);
        assert_eq!(Frame::new(9u8, Bytes::new()).frame_kind(), FrameKind::Other(9));
        assert_eq!(Frame::new(FrameKind::Pong, Bytes::new()).kind, kinds::PONG);
    }

    #[test]
    fn test_decode_partial_then_complete() {
        let frame = Frame::hello("writer");
        let encoded = encode_frame(&frame, MAX_FRAME_LEN).unwrap();

        let mut buf = BytesMut::new();
        buf.extend_from_slice(&encoded[..3]);
        assert_eq!(decode_frame(&mut buf, MAX_FRAME_LEN).unwrap(), None);
        buf.extend_from_slice(&encoded[3..7]);
        assert_eq!(decode_frame(&mut buf, MAX_FRAME_LEN).unwrap(), None);
        buf.extend_from_slice(&encoded[7..]);
        buf.extend_from_slice(&encoded);

        assert_eq!(decode_frame(&mut buf, MAX_FRAME_LEN).unwrap(), Some(frame.clone()));
        assert_eq!(decode_frame(&mut buf, MAX_FRAME_LEN).unwrap(), Some(frame));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_lengths() {
        let mut zero = BytesMut::from(&[0u8, 0, 0, 0, 1][..]);
        assert!(matches!(
            decode_frame(&mut zero, MAX_FRAME_LEN),
            Err(FrameError::ZeroLength)
        ));

        let mut huge = BytesMut::new();
        huge.put_u32(MAX_FRAME_LEN + 1);
        assert!(matches!(
            decode_frame(&mut huge, MAX_FRAME_LEN),
            Err(FrameError::TooLarge { got, .. }) if got == MAX_FRAME_LEN + 1
        ));

        // Exactly at the limit is accepted (just incomplete here).
        let mut limit = BytesMut::new();
        limit.put_u32(MAX_FRAME_LEN);
        assert_eq!(decode_frame(&mut limit, MAX_FRAME_LEN).unwrap(), None);
    }

    #[test]
    fn test_encode_rejects_oversize() {
        let frame = Frame::new(7u8, vec![0u8; 16]);
        assert!(encode_frame(&frame, 17).is_ok());
        assert!(matches!(
            encode_frame(&frame, 16),
            Err(FrameError::PayloadTooLarge { max: 16, got: 16 })
        ));
    }

    #[tokio::test]
    async fn test_read_write_stream() {
        let frames = vec![Frame::hello("hi"), Frame::ping(), Frame::new(77u8, vec![1, 2, 3])];
        let mut wire = Vec::new();
        for frame in &frames {
            write_frame(&mut wire, frame, MAX_FRAME_LEN).await.unwrap();
        }

        let mut reader = &wire[..];
        for frame in &frames {
            let read = read_frame(&mut reader, MAX_FRAME_LEN).await.unwrap();
            assert_eq!(read.as_ref(), Some(frame));
        }
        assert!(read_frame(&mut reader, MAX_FRAME_LEN).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_truncated() {
        let wire = encode_frame(&Frame::hello("truncated"), MAX_FRAME_LEN).unwrap();

        let mut header_only = &wire[..2];
        assert!(matches!(
            read_frame(&mut header_only, MAX_FRAME_LEN).await,
            Err(FrameError::Io(_))
        ));

        let mut short_payload = &wire[..wire.len() - 1];
        assert!(matches!(
            read_frame(&mut short_payload, MAX_FRAME_LEN).await,
            Err(FrameError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_read_rejects_zero_length() {
        let mut wire: &[u8] = &[0, 0, 0, 0];
        assert!(matches!(
            read_frame(&mut wire, MAX_FRAME_LEN).await,
            Err(FrameError::ZeroLength)
        ));
    }

    proptest! {
        #[test]
        fn test_decode_is_split_agnostic(
            payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 1..6),
            chunk in 1usize..16,
        ) {
            let frames: Vec<Frame> = payloads
                .into_iter()
                .enumerate()
                .map(|(i, p)| Frame::new(i as u8, p))
                .collect();
            let mut wire = Vec::new();
            for frame in &frames {
                wire.extend_from_slice(&encode_frame(frame, MAX_FRAME_LEN).unwrap());
            }

            // Feed the stream a few bytes at a time.
            let mut buf = BytesMut::new();
            let mut decoded = Vec::new();
            for piece in wire.chunks(chunk) {
                buf.extend_from_slice(piece);
                while let Some(frame) = decode_frame(&mut buf, MAX_FRAME_LEN).unwrap() {
                    decoded.push(frame);
                }
            }
            prop_assert_eq!(decoded, frames);
            prop_assert!(buf.is_empty());
        }
    }
}
