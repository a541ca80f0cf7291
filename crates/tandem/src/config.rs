//! Replica configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tandem_net::TransportConfig;

/// Default oplog file name.
pub const DEFAULT_OPLOG_PATH: &str = "oplog.log";

/// Default port, used both to listen on and to dial.
pub const DEFAULT_PORT: u16 = 5000;

/// Which side of the pair this replica is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Originates edits.
    Writer,
    /// Applies edits received from the writer.
    Reader,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Writer => "writer",
            Role::Reader => "reader",
        }
    }

    /// Whether this role may originate edits.
    pub fn can_originate(self) -> bool {
        self == Role::Writer
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("writer") {
            Ok(Role::Writer)
        } else if s.eq_ignore_ascii_case("reader") {
            Ok(Role::Reader)
        } else {
            Err(format!("role must be writer or reader, got {s:?}"))
        }
    }
}

/// Configuration for a [`Replica`](crate::Replica).
#[derive(Debug, Clone)]
pub struct ReplicaConfig {
    /// This replica's role.
    pub role: Role,
    /// Where applied ops are persisted.
    pub oplog_path: PathBuf,
    /// How to reach the peer.
    pub transport: TransportConfig,
}

impl ReplicaConfig {
    /// Defaults for `role`: `oplog.log`, transport not yet configured.
    pub fn new(role: Role) -> Self {
        Self {
            role,
            oplog_path: PathBuf::from(DEFAULT_OPLOG_PATH),
            transport: TransportConfig::default(),
        }
    }

    pub fn with_oplog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.oplog_path = path.into();
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self::new(Role::Reader)
    }
}
