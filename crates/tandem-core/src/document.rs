//! Document: a byte buffer mutated only through checksum-stamped ops.

use crate::checksum::{checksum, Checksum};
use crate::error::OpError;
use crate::op::{Op, OpKind};

/// The replicated text buffer.
///
/// Owns its content and the next sequence number to assign. Applying the
/// same ops in the same order to a fresh document always yields the same
/// bytes and therefore the same checksums.
#[derive(Debug, Clone)]
pub struct Document {
    content: Vec<u8>,
    next_seq: u64,
}

impl Document {
    /// Create an empty document. The first assigned seq is 1.
    pub fn new() -> Self {
        Self {
            content: Vec::new(),
            next_seq: 1,
        }
    }

    /// Current content.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Content as UTF-8, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }

    /// Content length in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the content is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The next sequence number that would be assigned.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// The highest sequence number applied so far (0 if none).
    pub fn last_seq(&self) -> u64 {
        self.next_seq - 1
    }

    /// Checksum of the current content.
    pub fn checksum(&self) -> Checksum {
        checksum(&self.content)
    }

    /// Apply an op and return the canonical, stamped record.
    ///
    /// A zero `seq` is replaced by the next sequence number. Any checksum
    /// carried by `op` is ignored and overwritten.
    pub fn apply(&mut self, op: &Op) -> Result<Op, OpError> {
        self.apply_inner(op, None)
    }

    /// Apply a recorded op and require its checksum to match.
    ///
    /// On mismatch the document is left unchanged.
    pub fn apply_verified(&mut self, op: &Op) -> Result<Op, OpError> {
        self.apply_inner(op, Some(op.checksum))
    }

    /// Insert `text` at `pos`.
    pub fn make_insert(&mut self, pos: u32, text: &[u8]) -> Result<Op, OpError> {
        self.apply(&Op::insert(pos, text))
    }

    /// Erase `len` bytes at `pos`.
    pub fn make_erase(&mut self, pos: u32, len: u32) -> Result<Op, OpError> {
        self.apply(&Op::erase(pos, len))
    }

    /// Replace `len` bytes at `pos` with `text`.
    pub fn make_replace(&mut self, pos: u32, len: u32, text: &[u8]) -> Result<Op, OpError> {
        self.apply(&Op::replace(pos, len, text))
    }

    fn apply_inner(&mut self, op: &Op, expected: Option<Checksum>) -> Result<Op, OpError> {
        let (start, end) = self.range_of(op)?;
        let seq = if op.seq == 0 { self.next_seq } else { op.seq };
        if seq == u64::MAX {
            return Err(OpError::SequenceExhausted);
        }

        let text: &[u8] = match op.kind {
            OpKind::Erase => &[],
            OpKind::Insert | OpKind::Replace => &op.text,
        };

        let mut next = Vec::with_capacity(self.content.len() - (end - start) + text.len());
        next.extend_from_slice(&self.content[..start]);
        next.extend_from_slice(text);
        next.extend_from_slice(&self.content[end..]);

        let actual = checksum(&next);
        if let Some(expected) = expected {
            if expected != actual {
                return Err(OpError::ChecksumMismatch {
                    seq,
                    expected,
                    actual,
                });
            }
        }

        self.content = next;
        self.next_seq = self.next_seq.max(seq + 1);

        Ok(Op {
            seq,
            kind: op.kind,
            pos: op.pos,
            len: if op.kind == OpKind::Insert { 0 } else { op.len },
            text: text.to_vec(),
            checksum: actual,
        })
    }

    /// Byte range `[start, end)` the op replaces.
    fn range_of(&self, op: &Op) -> Result<(usize, usize), OpError> {
        let doc_len = self.content.len();
        let out_of_bounds = || OpError::OutOfBounds {
            kind: op.kind,
            pos: op.pos,
            len: op.len,
            doc_len,
        };

        let start = op.pos as usize;
        let end = match op.kind {
            OpKind::Insert => start,
            OpKind::Erase | OpKind::Replace => {
                start.checked_add(op.len as usize).ok_or_else(out_of_bounds)?
            }
        };
        if end > doc_len {
            return Err(out_of_bounds());
        }
        Ok((start, end))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
