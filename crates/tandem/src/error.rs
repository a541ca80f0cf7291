//! Error types for replicas.

use tandem_core::{Checksum, CoreError, OpError, OpKind};
use tandem_net::TransportError;
use tandem_store::StoreError;
use thiserror::Error;

use crate::config::Role;

/// Errors that can occur during replica operations.
#[derive(Debug, Error)]
pub enum ReplicaError {
    /// Oplog error.
    #[error("oplog error: {0}")]
    Store(#[from] StoreError),

    /// The op could not be applied.
    #[error("op rejected: {0}")]
    Op(#[from] OpError),

    /// A received op could not be decoded, or a local op encoded.
    #[error("op encoding error: {0}")]
    Codec(#[from] CoreError),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// This role may not originate edits.
    #[error("{role} replica may not originate {kind}")]
    NotPermitted { role: Role, kind: OpKind },

    /// A received op produced different content than its sender had.
    #[error("replicas diverged at seq {seq}: peer has {expected}, local has {actual}")]
    Divergence {
        seq: u64,
        expected: Checksum,
        actual: Checksum,
    },
}

impl ReplicaError {
    /// Whether the replica can no longer be trusted to match its peer.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReplicaError::Divergence { .. })
    }
}

/// Result type for replica operations.
pub type Result<T> = std::result::Result<T, ReplicaError>;
