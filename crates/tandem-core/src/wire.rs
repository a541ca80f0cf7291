//! Length-prefixed binary encoding of ops, carried in OP frames.
//!
//! ```text
//! [8 bytes: seq      ]
//! [1 byte : kind     ]
//! [4 bytes: pos      ]
//! [4 bytes: len      ]
//! [4 bytes: checksum ]
//! [4 bytes: text_len ]
//! [text_len bytes: text]
//! ```
//!
//! All integers are big-endian.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::checksum::Checksum;
use crate::error::{CoreError, Result};
use crate::op::{Op, OpKind};

/// Size of the fixed part of an encoded op.
pub const HEADER_LEN: usize = 8 + 1 + 4 + 4 + 4 + 4;

/// Encode an op.
pub fn encode_op(op: &Op) -> Result<Bytes> {
    let text_len = u32::try_from(op.text.len()).map_err(|_| CoreError::FieldOutOfRange {
        field: "text_len",
        value: op.text.len(),
    })?;

    let mut buf = BytesMut::with_capacity(HEADER_LEN + op.text.len());
    buf.put_u64(op.seq);
    buf.put_u8(op.kind.as_u8());
    buf.put_u32(op.pos);
    buf.put_u32(op.len);
    buf.put_u32(op.checksum.value());
    buf.put_u32(text_len);
    buf.put_slice(&op.text);
    Ok(buf.freeze())
}

/// Decode an op. The input must contain exactly one encoded op.
pub fn decode_op(mut buf: &[u8]) -> Result<Op> {
    ensure(buf, HEADER_LEN)?;
    let seq = buf.get_u64();
    let kind = OpKind::try_from(buf.get_u8())?;
    let pos = buf.get_u32();
    let len = buf.get_u32();
    let checksum = Checksum(buf.get_u32());
    let text_len = buf.get_u32() as usize;

    ensure(buf, text_len)?;
    let text = buf[..text_len].to_vec();
    buf.advance(text_len);

    if buf.has_remaining() {
        return Err(CoreError::TrailingBytes(buf.remaining()));
    }

    Ok(Op {
        seq,
        kind,
        pos,
        len,
        text,
        checksum,
    })
}

fn ensure(buf: &[u8], needed: usize) -> Result<()> {
    if buf.len() < needed {
        return Err(CoreError::Truncated {
            needed,
            remaining: buf.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;

    #[test]
    fn test_layout() {
        let op = Op {
            seq: 1,
            kind: OpKind::Replace,
            pos: 2,
            len: 3,
            text: b"hi".to_vec(),
            checksum: Checksum(0x0102_0304),
        };
        let bytes = encode_op(&op).unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + 2);
        assert_eq!(&bytes[..8], &[0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(bytes[8], 3);
        assert_eq!(&bytes[17..21], &[1, 2, 3, 4]);
        assert_eq!(&bytes[21..25], &[0, 0, 0, 2]);
        assert_eq!(&bytes[25..], b"hi");
    }

    #[test]
    fn test_applied_op_survives_encoding() {
        let mut doc = Document::new();
        let op = doc.make_insert(0, b"line one\nline | two").unwrap();
        let decoded = decode_op(&encode_op(&op).unwrap()).unwrap();
        assert_eq!(decoded, op);
    }

    #[test]
    fn test_truncated() {
        let op = Op::insert(0, "abc").with_seq(1);
        let bytes = encode_op(&op).unwrap();
        assert!(matches!(
            decode_op(&bytes[..HEADER_LEN - 1]),
            Err(CoreError::Truncated { .. })
        ));
        assert!(matches!(
            decode_op(&bytes[..bytes.len() - 1]),
            Err(CoreError::Truncated { needed: 3, remaining: 2 })
        ));
    }

    #[test]
    fn test_trailing_and_unknown_kind() {
        let op = Op::erase(0, 1).with_seq(1);
        let mut bytes = encode_op(&op).unwrap().to_vec();
        bytes.push(0);
        assert_eq!(decode_op(&bytes), Err(CoreError::TrailingBytes(1)));

        bytes.pop();
        bytes[8] = 42;
        assert_eq!(decode_op(&bytes), Err(CoreError::UnknownOpKind(42)));
    }
}
