//! Error types for tandem core.

use thiserror::Error;

use crate::checksum::Checksum;
use crate::op::OpKind;

/// Errors raised while encoding or decoding ops.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown op kind: {0}")]
    UnknownOpKind(u8),

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("truncated op encoding: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("trailing bytes after op encoding: {0}")]
    TrailingBytes(usize),

    #[error("field {field} out of range: {value}")]
    FieldOutOfRange { field: &'static str, value: usize },
}

/// Errors raised by [`Document::apply`](crate::Document::apply).
///
/// A failed apply never mutates the document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpError {
    #[error("{kind} out of bounds: pos={pos} len={len} document length={doc_len}")]
    OutOfBounds {
        kind: OpKind,
        pos: u32,
        len: u32,
        doc_len: usize,
    },

    #[error("sequence number space exhausted")]
    SequenceExhausted,

    #[error("checksum mismatch at seq {seq}: recorded {expected}, computed {actual}")]
    ChecksumMismatch {
        seq: u64,
        expected: Checksum,
        actual: Checksum,
    },
}

/// Result type for core encoding operations.
pub type Result<T> = std::result::Result<T, CoreError>;
