//! # Tandem Core
//!
//! Pure primitives for tandem: checksums, edit operations, and the
//! document engine that applies them.
//!
//! This crate contains no I/O, no storage, no networking. Persistence lives
//! in `tandem-store`, the wire transport in `tandem-net`.
//!
//! ## Key Types
//!
//! - [`Op`] - One checksum-stamped edit (insert, erase, replace)
//! - [`OpKind`] - Discriminator for the edit
//! - [`Document`] - Byte buffer plus sequence counter, mutated only by [`Document::apply`]
//! - [`Checksum`] - CRC-32 of the document content after an op
//!
//! ## Encodings
//!
//! Ops have two encodings:
//!
//! - [`record`] - one escaped, pipe-delimited line per op, used by the oplog
//! - [`wire`] - length-prefixed binary, used as the payload of OP frames
//!
//! ## Example
//!
//! ```rust
//! use tandem_core::Document;
//!
//! let mut doc = Document::new();
//! doc.make_insert(0, b"AB").unwrap();
//! doc.make_insert(2, b"C").unwrap();
//! let op = doc.make_erase(1, 1).unwrap();
//!
//! assert_eq!(doc.content(), b"AC");
//! assert_eq!(op.seq, 3);
//! assert_eq!(op.checksum, tandem_core::checksum(b"AC"));
//! ```

pub mod checksum;
pub mod document;
pub mod error;
pub mod op;
pub mod record;
pub mod wire;

pub use checksum::{checksum, Checksum};
pub use document::Document;
pub use error::{CoreError, OpError};
pub use op::{Op, OpKind};
