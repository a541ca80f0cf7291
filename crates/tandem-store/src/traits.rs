//! OpLog trait: the abstract interface for op persistence.
//!
//! This trait keeps the document engine ignorant of storage. Implementations
//! include a plain file (primary) and in-memory (for tests).

use tandem_core::record::decode_record;
use tandem_core::{Document, Op};

use crate::error::{Result, StoreError};

/// Append-only log of applied ops.
///
/// # Design Notes
///
/// - **Append is the only mutation**: there is no rewrite or truncate.
/// - **The caller decides durability**: [`Document::apply`] never persists;
///   callers append the op it returns.
/// - **Replay reproduces state**: applying the loaded ops in order to an
///   empty document yields the content the log was written from.
pub trait OpLog: Send + Sync {
    /// Append one applied op.
    fn append(&self, op: &Op) -> Result<()>;

    /// Load every op, in log order.
    fn load(&self) -> Result<Vec<Op>>;

    /// Rebuild a document by applying every op in log order.
    ///
    /// Recorded checksums are not compared; use
    /// [`replay_verified`](OpLog::replay_verified) for that.
    fn replay(&self) -> Result<Document> {
        replay_ops(self.load()?, false)
    }

    /// Rebuild a document and require every recorded checksum to match.
    fn replay_verified(&self) -> Result<Document> {
        replay_ops(self.load()?, true)
    }
}

fn replay_ops(ops: Vec<Op>, verify: bool) -> Result<Document> {
    let mut doc = Document::new();
    for (index, op) in ops.iter().enumerate() {
        let applied = if verify {
            doc.apply_verified(op)
        } else {
            doc.apply(op)
        };
        applied.map_err(|source| StoreError::Replay {
            line: index + 1,
            source,
        })?;
    }
    tracing::debug!(
        ops = ops.len(),
        checksum = %doc.checksum(),
        verified = verify,
        "replayed oplog"
    );
    Ok(doc)
}

/// Decode a whole log image, skipping empty lines.
///
/// Line numbers in errors are 1-based and count empty lines.
pub(crate) fn decode_log(bytes: &[u8]) -> Result<Vec<Op>> {
    let mut ops = Vec::new();
    for (index, line) in bytes.split(|&b| b == b'\n').enumerate() {
        if line.is_empty() || line == b"\r" {
            continue;
        }
        let op = decode_record(line).map_err(|source| StoreError::Corrupt {
            line: index + 1,
            source,
        })?;
        ops.push(op);
    }
    Ok(ops)
}
