//! In-memory implementation of the OpLog trait.
//!
//! This is primarily for testing. It stores the same encoded lines as the
//! file log, so encoding bugs show up here too.

use std::sync::{PoisonError, RwLock};

use tandem_core::record::encode_record;
use tandem_core::Op;

use crate::error::Result;
use crate::traits::{decode_log, OpLog};

/// In-memory oplog.
///
/// All data is lost when the log is dropped. Thread-safe via RwLock.
#[derive(Debug, Default)]
pub struct MemoryOpLog {
    image: RwLock<Vec<u8>>,
}

impl MemoryOpLog {
    /// Create a new empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw log image, as it would appear on disk.
    pub fn image(&self) -> Vec<u8> {
        self.image
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl OpLog for MemoryOpLog {
    fn append(&self, op: &Op) -> Result<()> {
        let record = encode_record(op);
        self.image
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(&record);
        Ok(())
    }

    fn load(&self) -> Result<Vec<Op>> {
        let image = self.image.read().unwrap_or_else(PoisonError::into_inner);
        decode_log(&image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::Document;

    #[test]
    fn test_memory_log_replay() {
        let log = MemoryOpLog::new();
        let mut doc = Document::new();
        log.append(&doc.make_insert(0, b"hello\nworld").unwrap()).unwrap();
        log.append(&doc.make_replace(5, 1, b"|").unwrap()).unwrap();

        let image = log.image();
        assert_eq!(image.iter().filter(|&&b| b == b'\n').count(), 2);

        let replayed = log.replay_verified().unwrap();
        assert_eq!(replayed.content(), b"hello|world");
        assert_eq!(replayed.next_seq(), doc.next_seq());
    }
}
