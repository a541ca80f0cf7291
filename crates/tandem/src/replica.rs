//! The replica: a document, its oplog and a transport under one role.
//!
//! The replica is the only place where the document engine and the
//! transport meet. Neither knows about the other.

use bytes::Bytes;
use tokio::sync::Mutex;

use tandem_core::wire::{decode_op, encode_op};
use tandem_core::{Checksum, CoreError, Document, Op, OpError};
use tandem_net::{ConnectionState, Frame, FrameKind, Transport, TransportConfig};
use tandem_store::{FileOpLog, OpLog};

use crate::config::{ReplicaConfig, Role};
use crate::error::{ReplicaError, Result};

/// Outcome of handling one received frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A remote op was verified, applied and persisted.
    Applied(Op),
    /// The peer introduced itself.
    Hello(String),
    /// The peer acknowledged something.
    Ack(Bytes),
    /// The peer pinged; a PONG was sent back.
    Ping,
    /// Answer to one of our pings.
    Pong,
    /// A frame kind this replica does not act on.
    Ignored(u8),
}

/// One side of a tandem pair.
///
/// Every mutation holds the document lock from apply until the OP frame
/// is written, so ops leave in the order they were applied.
pub struct Replica<L: OpLog = FileOpLog> {
    role: Role,
    document: Mutex<Document>,
    oplog: L,
    transport: Transport,
}

impl Replica<FileOpLog> {
    /// Replay the oplog at `config.oplog_path` and build the transport.
    ///
    /// The transport is not started.
    pub fn open(config: ReplicaConfig) -> Result<Self> {
        let oplog = FileOpLog::new(config.oplog_path);
        Self::with_oplog(config.role, oplog, config.transport)
    }
}

impl<L: OpLog> Replica<L> {
    /// Build a replica over an arbitrary oplog.
    ///
    /// Every recorded checksum is verified during replay.
    pub fn with_oplog(role: Role, oplog: L, transport: TransportConfig) -> Result<Self> {
        let document = oplog.replay_verified()?;
        tracing::info!(
            role = %role,
            ops = document.last_seq(),
            bytes = document.len(),
            checksum = %document.checksum(),
            "replayed oplog"
        );
        Ok(Self {
            role,
            document: Mutex::new(document),
            oplog,
            transport: Transport::new(transport),
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn oplog(&self) -> &L {
        &self.oplog
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// A copy of the current document.
    pub async fn snapshot(&self) -> Document {
        self.document.lock().await.clone()
    }

    /// Checksum of the current content.
    pub async fn checksum(&self) -> Checksum {
        self.document.lock().await.checksum()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.transport.state()
    }

    pub async fn start(&self) -> Result<()> {
        self.transport.start().await?;
        Ok(())
    }

    pub async fn stop(&self) {
        self.transport.stop().await;
    }

    /// Introduce ourselves to the peer. `false` if not connected.
    pub async fn greet(&self) -> bool {
        self.transport
            .send_frame(&Frame::hello(self.role.as_str()))
            .await
    }

    /// Ping the peer. `false` if not connected.
    pub async fn ping(&self) -> bool {
        self.transport.send_frame(&Frame::ping()).await
    }

    pub async fn insert(&self, pos: u32, text: &[u8]) -> Result<Op> {
        self.originate(|_| Ok(Op::insert(pos, text))).await
    }

    pub async fn erase(&self, pos: u32, len: u32) -> Result<Op> {
        self.originate(|_| Ok(Op::erase(pos, len))).await
    }

    pub async fn replace(&self, pos: u32, len: u32, text: &[u8]) -> Result<Op> {
        self.originate(|_| Ok(Op::replace(pos, len, text))).await
    }

    /// Insert `text` at the current end of the document.
    pub async fn append(&self, text: &[u8]) -> Result<Op> {
        self.originate(|doc| {
            let end = u32::try_from(doc.len()).map_err(|_| CoreError::FieldOutOfRange {
                field: "pos",
                value: doc.len(),
            })?;
            Ok(Op::insert(end, text))
        })
        .await
    }

    /// Apply a locally originated op, persist it, then ship it.
    ///
    /// A failed send is logged and not retried; the op remains in the
    /// local document and oplog.
    async fn originate<F>(&self, build: F) -> Result<Op>
    where
        F: FnOnce(&Document) -> std::result::Result<Op, CoreError>,
    {
        let mut document = self.document.lock().await;
        let op = build(&*document)?;
        if !self.role.can_originate() {
            return Err(ReplicaError::NotPermitted {
                role: self.role,
                kind: op.kind,
            });
        }

        let mut next = document.clone();
        let applied = next.apply(&op)?;
        let payload = encode_op(&applied)?;
        self.oplog.append(&applied)?;
        *document = next;
        tracing::debug!(
            seq = applied.seq,
            kind = %applied.kind,
            checksum = %applied.checksum,
            "applied local op"
        );

        if let Err(e) = self.transport.send(&Frame::op(payload)).await {
            tracing::warn!(seq = applied.seq, error = %e, "op not delivered to peer");
        }
        Ok(applied)
    }

    /// Act on one received frame.
    ///
    /// OP frames are decoded, applied with checksum verification and
    /// persisted. A checksum disagreement is [`ReplicaError::Divergence`]
    /// and leaves the document and oplog untouched.
    pub async fn handle_frame(&self, frame: Frame) -> Result<Inbound> {
        match frame.frame_kind() {
            FrameKind::Op => {
                let op = decode_op(&frame.payload)?;
                self.apply_remote(op).await.map(Inbound::Applied)
            }
            FrameKind::Ping => {
                if !self.transport.send_frame(&Frame::pong()).await {
                    tracing::debug!("could not answer ping");
                }
                Ok(Inbound::Ping)
            }
            FrameKind::Pong => {
                tracing::debug!("pong");
                Ok(Inbound::Pong)
            }
            FrameKind::Hello => {
                let peer = String::from_utf8_lossy(&frame.payload).into_owned();
                tracing::info!(peer_role = %peer, "peer said hello");
                Ok(Inbound::Hello(peer))
            }
            FrameKind::Ack => {
                tracing::debug!(bytes = frame.payload.len(), "ack");
                Ok(Inbound::Ack(frame.payload))
            }
            FrameKind::Other(kind) => {
                tracing::debug!(kind, bytes = frame.payload.len(), "ignoring frame");
                Ok(Inbound::Ignored(kind))
            }
        }
    }

    async fn apply_remote(&self, op: Op) -> Result<Op> {
        let mut document = self.document.lock().await;
        let mut next = document.clone();
        let applied = match next.apply_verified(&op) {
            Ok(applied) => applied,
            Err(OpError::ChecksumMismatch {
                seq,
                expected,
                actual,
            }) => {
                tracing::error!(seq, %expected, %actual, "replicas diverged");
                return Err(ReplicaError::Divergence {
                    seq,
                    expected,
                    actual,
                });
            }
            Err(e) => return Err(e.into()),
        };
        self.oplog.append(&applied)?;
        *document = next;
        tracing::debug!(seq = applied.seq, kind = %applied.kind, "applied remote op");
        Ok(applied)
    }

    /// Handle every frame already queued, in arrival order.
    ///
    /// Stops at the first error; frames behind it stay queued.
    pub async fn pump(&self) -> Result<Vec<Inbound>> {
        let mut handled = Vec::new();
        while let Some(frame) = self.transport.pop_frame() {
            handled.push(self.handle_frame(frame).await?);
        }
        Ok(handled)
    }
}
