//! Transport configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::backoff::BackoffPolicy;
use crate::frame::MAX_FRAME_LEN;

/// Address of the peer to dial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAddr {
    pub host: String,
    pub port: u16,
}

impl PeerAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for PeerAddr {
    type Err = String;

    /// Parse `host:port`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("peer must be host:port, got {s:?}"))?;
        if host.is_empty() {
            return Err(format!("peer host is empty in {s:?}"));
        }
        let port = port
            .parse::<u16>()
            .map_err(|e| format!("invalid peer port in {s:?}: {e}"))?;
        Ok(Self::new(host, port))
    }
}

/// Configuration for a [`Transport`](crate::Transport).
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Interface to listen on.
    pub listen_host: String,
    /// Port to listen on. Zero disables the acceptor.
    pub listen_port: u16,
    /// Peer to dial. `None` disables the dialer.
    pub peer: Option<PeerAddr>,
    /// Reconnect delays for the dialer.
    pub backoff: BackoffPolicy,
    /// Dialer sleep while a connection is established.
    pub idle_poll: Duration,
    /// Pause after a failed accept.
    pub accept_retry: Duration,
    /// Largest accepted frame length field.
    pub max_frame_len: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            listen_host: "0.0.0.0".to_string(),
            listen_port: 0,
            peer: None,
            backoff: BackoffPolicy::default(),
            idle_poll: Duration::from_millis(200),
            accept_retry: Duration::from_millis(100),
            max_frame_len: MAX_FRAME_LEN,
        }
    }
}

impl TransportConfig {
    /// Build from the classic triple: a listen port (0 disables) and a peer
    /// host/port (empty host or zero port disables).
    pub fn from_parts(listen_port: u16, peer_host: &str, peer_port: u16) -> Self {
        let peer = (!peer_host.is_empty() && peer_port > 0)
            .then(|| PeerAddr::new(peer_host, peer_port));
        Self {
            listen_port,
            peer,
            ..Self::default()
        }
    }

    /// Accept connections on `port`.
    pub fn listen(port: u16) -> Self {
        Self::default().with_listen(port)
    }

    /// Dial `host:port`.
    pub fn dial(host: impl Into<String>, port: u16) -> Self {
        Self::default().with_peer(PeerAddr::new(host, port))
    }

    pub fn with_listen(mut self, port: u16) -> Self {
        self.listen_port = port;
        self
    }

    pub fn with_listen_host(mut self, host: impl Into<String>) -> Self {
        self.listen_host = host.into();
        self
    }

    pub fn with_peer(mut self, peer: PeerAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Whether the acceptor role is enabled.
    pub fn is_listening(&self) -> bool {
        self.listen_port > 0
    }

    /// Whether the dialer role is enabled.
    pub fn is_dialing(&self) -> bool {
        self.peer.is_some()
    }
}
