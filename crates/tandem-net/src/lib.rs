//! # Tandem Net
//!
//! Framed TCP transport between two tandem replicas.
//!
//! ## Overview
//!
//! A [`Transport`] keeps at most one live connection to a peer. It can
//! accept inbound connections, dial out to a configured peer, or both;
//! whichever side establishes a connection most recently wins the slot.
//! The dialer retries with exponential backoff (100 ms doubling to a 3 s
//! cap) and resets after every successful connect.
//!
//! Received frames are queued in arrival order and handed out with
//! [`Transport::pop_frame`] or [`Transport::recv_frame`].
//!
//! ## Framing
//!
//! ```text
//! [4 bytes: L, big-endian][1 byte: kind][L - 1 bytes: payload]
//! ```
//!
//! `L` counts the kind byte plus the payload. A zero `L`, or one above
//! [`MAX_FRAME_LEN`], is a protocol violation and the connection is dropped.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use tandem_net::{Frame, Transport, TransportConfig};
//!
//! # async fn example() -> tandem_net::Result<()> {
//! let transport = Transport::new(TransportConfig::from_parts(5000, "peer.local", 5001));
//! transport.start().await?;
//!
//! transport.send(&Frame::hello("writer")).await?;
//! if let Some(frame) = transport.recv_frame(Duration::from_secs(1)).await {
//!     println!("kind {} with {} bytes", frame.kind, frame.payload.len());
//! }
//!
//! transport.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod config;
pub mod error;
pub mod frame;
pub mod queue;
pub mod transport;

pub use backoff::{Backoff, BackoffPolicy};
pub use config::{PeerAddr, TransportConfig};
pub use error::{FrameError, Result, TransportError};
pub use frame::{
    decode_frame, encode_frame, kinds, read_frame, write_frame, Frame, FrameKind, MAX_FRAME_LEN,
};
pub use queue::FrameQueue;
pub use transport::{ConnectionState, Transport};
