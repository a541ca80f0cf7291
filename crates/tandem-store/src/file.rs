//! File-backed oplog.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tandem_core::record::encode_record;
use tandem_core::Op;

use crate::error::Result;
use crate::traits::{decode_log, OpLog};

/// An oplog stored as one escaped line per op.
///
/// Every append opens the file in append mode, so the log may be shared
/// across the life of a process and across restarts.
#[derive(Debug, Clone)]
pub struct FileOpLog {
    path: PathBuf,
    fsync: bool,
}

impl FileOpLog {
    /// Use the log at `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fsync: false,
        }
    }

    /// Flush appends to stable storage before returning.
    pub fn with_fsync(mut self, fsync: bool) -> Self {
        self.fsync = fsync;
        self
    }

    /// The log's path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OpLog for FileOpLog {
    fn append(&self, op: &Op) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // One write per record keeps concurrent appenders line-atomic.
        file.write_all(&encode_record(op))?;
        if self.fsync {
            file.sync_data()?;
        }
        tracing::trace!(seq = op.seq, path = %self.path.display(), "appended op");
        Ok(())
    }

    fn load(&self) -> Result<Vec<Op>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        decode_log(&bytes)
    }
}
