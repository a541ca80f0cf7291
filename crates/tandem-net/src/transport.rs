//! TCP transport with a single connection slot.
//!
//! The transport runs up to three kinds of background task:
//!
//! - **acceptor** (listen port configured): accepts inbound connections
//! - **dialer** (peer configured): connects out, with exponential backoff
//! - **reader** (one per live connection): the only reader of its socket
//!
//! Whichever side establishes a connection last owns the slot; the
//! previous connection is shut down. The read half of a socket belongs to
//! its reader task, the write half sits behind a per-connection async
//! mutex that serializes senders.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{lookup_host, TcpListener, TcpStream};
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use crate::backoff::Backoff;
use crate::config::{PeerAddr, TransportConfig};
use crate::error::{Result, TransportError};
use crate::frame::{encode_frame, read_frame, Frame};
use crate::queue::FrameQueue;

/// Observable state of the connection slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// A live connection occupying the slot.
struct Connection {
    id: u64,
    peer: SocketAddr,
    writer: Arc<AsyncMutex<OwnedWriteHalf>>,
    reader: JoinHandle<()>,
    /// Set (or dropped) when the connection leaves the slot; cancels sends.
    closed: watch::Sender<bool>,
}

impl Connection {
    /// Cancel in-flight sends and stop the reader.
    ///
    /// Never waits on the write lock. The write half shuts down when the
    /// last holder drops it, which a cancelled sender does at once.
    fn close(self) -> JoinHandle<()> {
        self.closed.send_replace(true);
        self.reader.abort();
        self.reader
    }
}

struct Shared {
    config: TransportConfig,
    running: AtomicBool,
    connected: AtomicBool,
    connecting: AtomicBool,
    slot: Mutex<Option<Connection>>,
    inbound: FrameQueue,
    shutdown: watch::Sender<bool>,
    next_id: AtomicU64,
}

/// Framed TCP link to exactly one peer at a time.
///
/// Must be started from within a tokio runtime.
pub struct Transport {
    shared: Arc<Shared>,
    local_addr: Mutex<Option<SocketAddr>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl Transport {
    /// Create a transport. Nothing runs until [`start`](Self::start).
    pub fn new(config: TransportConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                config,
                running: AtomicBool::new(false),
                connected: AtomicBool::new(false),
                connecting: AtomicBool::new(false),
                slot: Mutex::new(None),
                inbound: FrameQueue::new(),
                shutdown,
                next_id: AtomicU64::new(1),
            }),
            local_addr: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        }
    }

    /// The configuration this transport was built with.
    pub fn config(&self) -> &TransportConfig {
        &self.shared.config
    }

    /// Launch the acceptor and/or dialer.
    ///
    /// The listener is bound before this returns. If binding fails and a
    /// peer is configured, the transport carries on dialer-only; with no
    /// peer it has nothing to do and the bind error is returned.
    pub async fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(TransportError::AlreadyStarted);
        }
        let config = &self.shared.config;
        self.shared.running.store(true, Ordering::SeqCst);

        let mut tasks = Vec::new();

        if config.is_listening() {
            let addr = format!("{}:{}", config.listen_host, config.listen_port);
            match TcpListener::bind(&addr).await {
                Ok(listener) => {
                    let local = listener.local_addr().ok();
                    *lock(&self.local_addr) = local;
                    tracing::info!(addr = %addr, "listening");
                    let shared = Arc::clone(&self.shared);
                    let shutdown = self.shared.shutdown.subscribe();
                    tasks.push(tokio::spawn(shared.accept_loop(listener, shutdown)));
                }
                Err(source) => {
                    tracing::error!(
                        addr = %addr,
                        error = %source,
                        "bind failed; acceptor disabled"
                    );
                    if !config.is_dialing() {
                        self.shared.running.store(false, Ordering::SeqCst);
                        return Err(TransportError::Bind { addr, source });
                    }
                    tracing::warn!("continuing in dialer-only mode");
                }
            }
        }

        if let Some(peer) = config.peer.clone() {
            let shared = Arc::clone(&self.shared);
            let shutdown = self.shared.shutdown.subscribe();
            tasks.push(tokio::spawn(shared.dial_loop(peer, shutdown)));
        }

        if tasks.is_empty() {
            tracing::warn!("transport started with neither a listen port nor a peer");
        }

        lock(&self.tasks).extend(tasks);
        Ok(())
    }

    /// Stop every task and close every socket.
    ///
    /// Returns once all background work has finished. Safe to call more
    /// than once; the transport cannot be restarted afterwards.
    pub async fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.shutdown.send_replace(true);

        let tasks = std::mem::take(&mut *lock(&self.tasks));
        for task in tasks {
            let _ = task.await;
        }

        // Acceptor and dialer are gone, so nothing can install a new
        // connection past this point.
        let connection = lock(&self.shared.slot).take();
        self.shared.connected.store(false, Ordering::SeqCst);
        self.shared.connecting.store(false, Ordering::SeqCst);
        if let Some(connection) = connection {
            let peer = connection.peer;
            let _ = connection.close().await;
            tracing::info!(peer = %peer, "connection closed");
        }

        self.shared.inbound.close();
        tracing::debug!("transport stopped");
    }

    /// Send one frame to the current peer.
    ///
    /// The whole frame goes out in one write, serialized against other
    /// senders. A failure part-way leaves the frame partially sent; there
    /// is no delivery guarantee.
    ///
    /// A send blocked on a peer that stopped reading is cancelled with
    /// [`TransportError::Closed`] when the connection is replaced or
    /// dropped, or when the transport stops.
    pub async fn send(&self, frame: &Frame) -> Result<()> {
        let buf = encode_frame(frame, self.shared.config.max_frame_len)?;

        let (id, writer, mut closed) = {
            let slot = lock(&self.shared.slot);
            let connection = slot.as_ref().ok_or(TransportError::NotConnected)?;
            (
                connection.id,
                Arc::clone(&connection.writer),
                connection.closed.subscribe(),
            )
        };
        let mut shutdown = self.shared.shutdown.subscribe();

        let write = async {
            let mut writer = writer.lock().await;
            writer.write_all(&buf).await
        };
        let written = tokio::select! {
            written = write => written,
            _ = signalled(&mut closed) => return Err(TransportError::Closed),
            _ = signalled(&mut shutdown) => return Err(TransportError::Closed),
        };
        if let Err(e) = written {
            tracing::warn!(connection = id, error = %e, "send failed");
            return Err(e.into());
        }
        tracing::trace!(connection = id, kind = frame.kind, bytes = buf.len(), "sent frame");
        Ok(())
    }

    /// Send one frame; `false` if not connected or the write failed.
    pub async fn send_frame(&self, frame: &Frame) -> bool {
        match self.send(frame).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(kind = frame.kind, error = %e, "frame not sent");
                false
            }
        }
    }

    /// Take the oldest received frame without blocking.
    pub fn pop_frame(&self) -> Option<Frame> {
        self.shared.inbound.pop()
    }

    /// Wait up to `timeout` for a received frame. Returns early on stop.
    pub async fn recv_frame(&self, timeout: Duration) -> Option<Frame> {
        self.shared.inbound.pop_wait(timeout).await
    }

    /// Number of received frames waiting to be popped.
    pub fn pending_frames(&self) -> usize {
        self.shared.inbound.len()
    }

    /// Whether a connection currently occupies the slot.
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> ConnectionState {
        if self.is_connected() {
            ConnectionState::Connected
        } else if self.shared.connecting.load(Ordering::SeqCst) {
            ConnectionState::Connecting
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Address the acceptor is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *lock(&self.local_addr)
    }

    /// Remote address of the current connection.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        lock(&self.shared.slot).as_ref().map(|c| c.peer)
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.shutdown.send_replace(true);
        for task in lock(&self.tasks).drain(..) {
            task.abort();
        }
        if let Some(connection) = lock(&self.shared.slot).take() {
            connection.close();
        }
    }
}

impl Shared {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Put a fresh connection into the slot, displacing any previous one.
    fn install(self: &Arc<Self>, stream: TcpStream, peer: SocketAddr) {
        if !self.is_running() {
            return;
        }
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "set_nodelay failed");
        }
        let (read_half, write_half) = stream.into_split();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let previous = {
            let mut slot = lock(&self.slot);
            // Spawned under the slot lock so a reader that ends at once
            // cannot clear the slot before it holds this connection.
            let reader = tokio::spawn(Arc::clone(self).read_loop(
                id,
                peer,
                read_half,
                self.shutdown.subscribe(),
            ));
            let (closed, _) = watch::channel(false);
            let previous = slot.replace(Connection {
                id,
                peer,
                writer: Arc::new(AsyncMutex::new(write_half)),
                reader,
                closed,
            });
            self.connected.store(true, Ordering::SeqCst);
            previous
        };

        if let Some(previous) = previous {
            tracing::info!(old = %previous.peer, new = %peer, "replacing existing connection");
            previous.close();
        }
        tracing::info!(connection = id, peer = %peer, "connected");
    }

    /// Release the slot if it still holds connection `id`.
    ///
    /// Called by the connection's own reader, so the reader is left to
    /// finish rather than aborted.
    fn clear(&self, id: u64) {
        let connection = {
            let mut slot = lock(&self.slot);
            if slot.as_ref().map(|c| c.id) != Some(id) {
                return;
            }
            self.connected.store(false, Ordering::SeqCst);
            slot.take()
        };
        if let Some(connection) = connection {
            connection.closed.send_replace(true);
            tracing::info!(connection = id, peer = %connection.peer, "disconnected");
        }
    }

    async fn accept_loop(
        self: Arc<Self>,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) {
        while self.is_running() && !*shutdown.borrow() {
            tokio::select! {
                _ = shutdown.changed() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::info!(peer = %peer, "accepted connection");
                        self.install(stream, peer);
                    }
                    Err(e) => {
                        if !self.is_running() {
                            break;
                        }
                        let retry = self.config.accept_retry;
                        tracing::warn!(
                            error = %e,
                            retry_ms = retry.as_millis() as u64,
                            "accept failed; retrying"
                        );
                        if !pause(&mut shutdown, retry).await {
                            break;
                        }
                    }
                },
            }
        }
        tracing::debug!("acceptor stopped");
    }

    async fn dial_loop(self: Arc<Self>, peer: PeerAddr, mut shutdown: watch::Receiver<bool>) {
        let mut backoff = Backoff::new(self.config.backoff);

        while self.is_running() && !*shutdown.borrow() {
            if self.connected.load(Ordering::SeqCst) {
                if !pause(&mut shutdown, self.config.idle_poll).await {
                    break;
                }
                continue;
            }

            self.connecting.store(true, Ordering::SeqCst);
            tracing::info!(peer = %peer, "connecting");
            let attempt = tokio::select! {
                _ = shutdown.changed() => {
                    self.connecting.store(false, Ordering::SeqCst);
                    break;
                }
                attempt = dial(&peer) => attempt,
            };
            self.connecting.store(false, Ordering::SeqCst);

            match attempt {
                Ok((stream, addr)) => {
                    backoff.reset();
                    self.install(stream, addr);
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    tracing::warn!(
                        peer = %peer,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "connect failed; backing off"
                    );
                    if !pause(&mut shutdown, delay).await {
                        break;
                    }
                }
            }
        }
        tracing::debug!(peer = %peer, "dialer stopped");
    }

    async fn read_loop(
        self: Arc<Self>,
        id: u64,
        peer: SocketAddr,
        mut reader: OwnedReadHalf,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let max_len = self.config.max_frame_len;
        while !*shutdown.borrow() {
            tokio::select! {
                _ = shutdown.changed() => break,
                read = read_frame(&mut reader, max_len) => match read {
                    Ok(Some(frame)) => {
                        tracing::debug!(
                            connection = id,
                            kind = frame.kind,
                            bytes = frame.payload.len(),
                            "received frame"
                        );
                        self.inbound.push(frame);
                    }
                    Ok(None) => {
                        tracing::info!(connection = id, peer = %peer, "peer closed connection");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(
                            connection = id,
                            peer = %peer,
                            error = %e,
                            "dropping connection"
                        );
                        break;
                    }
                },
            }
        }
        drop(reader);
        self.clear(id);
    }
}

/// Resolve `peer` and connect to the first address that accepts.
async fn dial(peer: &PeerAddr) -> Result<(TcpStream, SocketAddr)> {
    let addrs: Vec<SocketAddr> = lookup_host((peer.host.as_str(), peer.port))
        .await
        .map_err(|source| TransportError::Resolve {
            peer: peer.to_string(),
            source,
        })?
        .collect();

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok((stream, addr)),
            Err(e) => last_error = Some(e),
        }
    }
    match last_error {
        Some(source) => Err(TransportError::Connect {
            peer: peer.to_string(),
            source,
        }),
        None => Err(TransportError::NoAddress(peer.to_string())),
    }
}

/// Resolve once `signal` is set or its sender is gone.
async fn signalled(signal: &mut watch::Receiver<bool>) {
    let _ = signal.wait_for(|&set| set).await;
}

/// Sleep for `delay`; `false` if shutdown was signalled first.
async fn pause(shutdown: &mut watch::Receiver<bool>, delay: Duration) -> bool {
    if *shutdown.borrow() {
        return false;
    }
    tokio::select! {
        _ = shutdown.changed() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
