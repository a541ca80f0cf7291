//! Edit operations: the atomic unit of document history.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::checksum::Checksum;
use crate::error::CoreError;

/// The kind of edit an [`Op`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OpKind {
    /// Insert `text` at `pos`. `len` is ignored.
    Insert = 1,
    /// Remove `len` bytes starting at `pos`. `text` is empty.
    Erase = 2,
    /// Replace `len` bytes starting at `pos` with `text`.
    Replace = 3,
}

impl OpKind {
    /// The numeric tag used by the oplog and the wire encoding.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for OpKind {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(OpKind::Insert),
            2 => Ok(OpKind::Erase),
            3 => Ok(OpKind::Replace),
            other => Err(CoreError::UnknownOpKind(other)),
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpKind::Insert => "INSERT",
            OpKind::Erase => "ERASE",
            OpKind::Replace => "REPLACE",
        };
        f.write_str(name)
    }
}

/// One edit against the document buffer.
///
/// Positions and lengths are byte offsets, not code points. The engine
/// does not check UTF-8 boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Op {
    /// Sequence number. Zero asks the document to assign the next one.
    pub seq: u64,
    /// What the op does.
    pub kind: OpKind,
    /// Byte offset into the document.
    pub pos: u32,
    /// Bytes affected (erase/replace only).
    pub len: u32,
    /// Payload (insert/replace only).
    pub text: Vec<u8>,
    /// Checksum of the document content after this op was applied.
    pub checksum: Checksum,
}

impl Op {
    /// An unsequenced insert.
    pub fn insert(pos: u32, text: impl Into<Vec<u8>>) -> Self {
        Self {
            seq: 0,
            kind: OpKind::Insert,
            pos,
            len: 0,
            text: text.into(),
            checksum: Checksum::EMPTY,
        }
    }

    /// An unsequenced erase.
    pub fn erase(pos: u32, len: u32) -> Self {
        Self {
            seq: 0,
            kind: OpKind::Erase,
            pos,
            len,
            text: Vec::new(),
            checksum: Checksum::EMPTY,
        }
    }

    /// An unsequenced replace.
    pub fn replace(pos: u32, len: u32, text: impl Into<Vec<u8>>) -> Self {
        Self {
            seq: 0,
            kind: OpKind::Replace,
            pos,
            len,
            text: text.into(),
            checksum: Checksum::EMPTY,
        }
    }

    /// Set an explicit sequence number.
    pub fn with_seq(mut self, seq: u64) -> Self {
        self.seq = seq;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        for kind in [OpKind::Insert, OpKind::Erase, OpKind::Replace] {
            assert_eq!(OpKind::try_from(kind.as_u8()).unwrap(), kind);
        }
        assert_eq!(OpKind::try_from(0), Err(CoreError::UnknownOpKind(0)));
        assert_eq!(OpKind::try_from(4), Err(CoreError::UnknownOpKind(4)));
    }

    #[test]
    fn test_constructors_are_unsequenced() {
        let op = Op::replace(3, 2, "xy");
        assert_eq!(op.seq, 0);
        assert_eq!(op.kind, OpKind::Replace);
        assert_eq!(op.text, b"xy");
        assert!(Op::erase(0, 1).text.is_empty());
        assert_eq!(Op::insert(0, "a").with_seq(9).seq, 9);
    }

    #[test]
    fn test_serde_shape() {
        let op = Op::insert(1, "a").with_seq(2);
        let json = serde_json::to_string(&op).unwrap();
        let back: Op = serde_json::from_str(&json).unwrap();
        assert_eq!(op, back);
    }
}
