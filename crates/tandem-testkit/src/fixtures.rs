//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::time::{sleep, Instant};

use tandem_core::Document;
use tandem_net::{BackoffPolicy, Transport, TransportConfig};
use tandem_store::{FileOpLog, OpLog};

/// An oplog file in a private temporary directory.
pub struct OplogFixture {
    dir: TempDir,
    path: PathBuf,
}

impl OplogFixture {
    /// Create a fixture whose log file does not exist yet.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let path = dir.path().join("oplog.log");
        Self { dir, path }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The temporary directory holding the log.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// An oplog over the fixture's file.
    pub fn log(&self) -> FileOpLog {
        FileOpLog::new(&self.path)
    }

    /// Raw file contents (empty if the file does not exist).
    pub fn raw(&self) -> Vec<u8> {
        std::fs::read(&self.path).unwrap_or_default()
    }

    /// Run a seeded random session, appending every op to the log.
    pub fn write_random_session(&self, seed: u64, steps: usize) -> Document {
        let mut rng = StdRng::seed_from_u64(seed);
        random_session(&mut rng, steps, &self.log())
    }
}

impl Default for OplogFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-byte edits biased towards inserts, each appended to `log`.
///
/// Two fifths of the steps insert `X`, one fifth erase one byte, the rest
/// replace one byte with `Y`. An empty document always gets an insert.
pub fn random_session<R: Rng>(rng: &mut R, steps: usize, log: &impl OpLog) -> Document {
    let mut doc = Document::new();
    for _ in 0..steps {
        let choice = rng.gen_range(0..=4);
        let len = doc.len() as u32;
        let op = if choice < 2 || len == 0 {
            doc.make_insert(rng.gen_range(0..=len), b"X")
        } else if choice == 2 {
            doc.make_erase(rng.gen_range(0..len), 1)
        } else {
            doc.make_replace(rng.gen_range(0..len), 1, b"Y")
        };
        let op = op.expect("session op out of bounds");
        log.append(&op).expect("failed to append session op");
    }
    doc
}

/// A localhost port that was free a moment ago.
pub async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind ephemeral port");
    listener
        .local_addr()
        .expect("bound listener has an address")
        .port()
}

/// Poll `condition` every 10ms until it holds or `timeout` passes.
pub async fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(Duration::from_millis(10)).await;
    }
}

/// Backoff short enough for tests.
pub fn fast_backoff() -> BackoffPolicy {
    BackoffPolicy {
        initial: Duration::from_millis(10),
        max: Duration::from_millis(50),
    }
}

/// Config for a listener on `port` bound to localhost.
pub fn listen_config(port: u16) -> TransportConfig {
    TransportConfig::listen(port).with_listen_host("127.0.0.1")
}

/// Config for a dialer to localhost `port` with fast backoff.
pub fn dial_config(port: u16) -> TransportConfig {
    TransportConfig::dial("127.0.0.1", port).with_backoff(fast_backoff())
}

/// A started (listener, dialer) pair, both connected.
pub async fn connected_pair() -> (Transport, Transport) {
    let port = free_port().await;
    let server = Transport::new(listen_config(port));
    server.start().await.expect("listener failed to start");
    let client = Transport::new(dial_config(port));
    client.start().await.expect("dialer failed to start");

    let up = wait_for(Duration::from_secs(5), || {
        server.is_connected() && client.is_connected()
    })
    .await;
    assert!(up, "transports did not connect on port {port}");
    (server, client)
}
