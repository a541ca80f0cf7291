//! # Tandem Store
//!
//! Durable, append-only oplog for tandem documents.
//!
//! ## Overview
//!
//! The oplog is the sole source of truth for rebuilding a [`Document`]
//! after a restart. It is abstracted behind the [`OpLog`] trait. The
//! primary implementation is [`FileOpLog`], with [`MemoryOpLog`] for tests.
//!
//! ## Key Types
//!
//! - [`OpLog`] - Append, load and replay interface
//! - [`FileOpLog`] - One escaped line per op in a file opened in append mode
//! - [`MemoryOpLog`] - Same encoding, kept in memory
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tandem_core::Document;
//! use tandem_store::{append_to_oplog, replay_from_log};
//!
//! let mut doc = Document::new();
//! let op = doc.make_insert(0, b"hello").unwrap();
//! append_to_oplog("doc.oplog", &op).unwrap();
//!
//! let replayed = replay_from_log("doc.oplog").unwrap();
//! assert_eq!(replayed.content(), doc.content());
//! ```
//!
//! ## Design Notes
//!
//! - **Append only**: the file is never truncated, rewritten or compacted
//! - **File order**: loading preserves line order and does not re-sort
//! - **Missing file**: loads as an empty log
//! - **Verified replay**: [`OpLog::replay_verified`] checks every recorded checksum

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

use std::path::Path;

use tandem_core::{Document, Op};

pub use error::{Result, StoreError};
pub use file::FileOpLog;
pub use memory::MemoryOpLog;
pub use traits::OpLog;

/// Append one op to the log at `path`, creating the file if needed.
pub fn append_to_oplog(path: impl AsRef<Path>, op: &Op) -> Result<()> {
    FileOpLog::new(path.as_ref()).append(op)
}

/// Load every op from the log at `path`, in file order.
pub fn load_oplog(path: impl AsRef<Path>) -> Result<Vec<Op>> {
    FileOpLog::new(path.as_ref()).load()
}

/// Rebuild a document by applying every op in the log at `path`.
pub fn replay_from_log(path: impl AsRef<Path>) -> Result<Document> {
    FileOpLog::new(path.as_ref()).replay()
}
