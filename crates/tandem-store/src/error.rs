//! Error types for the store module.

use thiserror::Error;

use tandem_core::{CoreError, OpError};

/// Errors that can occur during oplog operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line could not be decoded.
    #[error("corrupt record at line {line}: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: CoreError,
    },

    /// A loaded op could not be re-applied.
    #[error("replay failed at line {line}: {source}")]
    Replay {
        line: usize,
        #[source]
        source: OpError,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
