//! # Tandem
//!
//! Two-peer replicated text editing over TCP.
//!
//! ## Overview
//!
//! One peer, the **writer**, originates edits. Every edit is applied to a
//! local [`Document`](tandem_core::Document), stamped with a sequence number
//! and a CRC-32 of the resulting content, appended to an oplog, and shipped
//! to the other peer in an OP frame. The **reader** applies received ops
//! and checks that its content hashes to the same value. A disagreement
//! is divergence and is fatal.
//!
//! ## Key Concepts
//!
//! - **Op**: One checksum-stamped edit (insert, erase, replace).
//! - **Oplog**: Append-only file of applied ops; replaying it rebuilds the document.
//! - **Transport**: A single TCP connection, re-established with backoff.
//! - **Replica**: A document, its oplog and a transport, under one role.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tandem::{Replica, ReplicaConfig, Role};
//! use tandem::net::TransportConfig;
//!
//! # async fn example() -> tandem::Result<()> {
//! let config = ReplicaConfig::new(Role::Writer)
//!     .with_oplog_path("doc.oplog")
//!     .with_transport(TransportConfig::from_parts(5000, "peer.local", 5000));
//!
//! let replica = Replica::open(config)?;
//! replica.start().await?;
//! replica.insert(0, b"hello").await?;
//! replica.stop().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `tandem::core` - Checksums, ops, the document engine
//! - `tandem::store` - The oplog
//! - `tandem::net` - Frames and the TCP transport

pub mod config;
pub mod error;
pub mod replica;

// Re-export component crates
pub use tandem_core as core;
pub use tandem_net as net;
pub use tandem_store as store;

// Re-export main types for convenience
pub use config::{ReplicaConfig, Role};
pub use error::{ReplicaError, Result};
pub use replica::{Inbound, Replica};

// Re-export commonly used component types
pub use tandem_core::{checksum, Checksum, Document, Op, OpKind};
pub use tandem_net::{Frame, FrameKind, Transport, TransportConfig};
pub use tandem_store::{FileOpLog, MemoryOpLog, OpLog};
