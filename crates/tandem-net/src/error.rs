//! Error types for the transport.

use thiserror::Error;

/// Errors produced by the frame codec.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Socket error while reading or writing a frame.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer declared a zero-length frame.
    #[error("frame length cannot be zero")]
    ZeroLength,

    /// The peer declared a frame larger than the limit.
    #[error("frame too large: max {max} got {got}")]
    TooLarge { max: u32, got: u32 },

    /// A local frame would exceed the limit once encoded.
    #[error("payload too large to frame: max {max} got {got}")]
    PayloadTooLarge { max: u32, got: usize },
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No connection is currently established.
    #[error("not connected")]
    NotConnected,

    /// The connection closed or the transport stopped while a send was
    /// in flight.
    #[error("connection closed during send")]
    Closed,

    /// `start` was called more than once.
    #[error("transport already started")]
    AlreadyStarted,

    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The peer host name could not be resolved.
    #[error("failed to resolve {peer}: {source}")]
    Resolve {
        peer: String,
        #[source]
        source: std::io::Error,
    },

    /// The peer host name resolved to no addresses.
    #[error("no addresses for {0}")]
    NoAddress(String),

    /// Every resolved address refused the connection.
    #[error("failed to connect to {peer}: {source}")]
    Connect {
        peer: String,
        #[source]
        source: std::io::Error,
    },

    /// Frame codec error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
