//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use tracing::warn;

use crate::config::SyncStrategy;
use crate::error::Result;

use super::{Operation, WalEntry};

/// Writes entries to the WAL file
pub struct WalWriter {
    file: File,
    /// LSN the next entry will get
    next_lsn: u64,
    sync_strategy: SyncStrategy,
    /// Entries written since the last fsync
    unsynced: usize,
    /// File length after the last complete entry
    len: u64,
    #[cfg(test)]
    fail_sync: bool,
}

/// Writer position before an append, restored when the append fails
#[derive(Clone, Copy)]
struct Tail {
    len: u64,
    next_lsn: u64,
    unsynced: usize,
}

impl WalWriter {
    /// Open or create a WAL file, starting at LSN 1
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        Self::resume(path, sync_strategy, 0)
    }

    /// Open a recovered WAL file whose last valid entry has `last_lsn`
    pub fn resume(path: &Path, sync_strategy: SyncStrategy, last_lsn: u64) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            file,
            next_lsn: last_lsn + 1,
            sync_strategy,
            unsynced: 0,
            len,
            #[cfg(test)]
            fail_sync: false,
        })
    }

    /// Append an entry to the WAL, syncing according to the strategy
    ///
    /// Returns the LSN assigned to the entry. If the write or a due sync
    /// fails, the entry is cut from the file before the error is returned.
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        let due = match self.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNEntries { count } => self.unsynced + 1 >= count,
        };
        self.append_inner(operation, due)
    }

    /// Append an entry and fsync before returning, whatever the strategy
    ///
    /// On error the file holds nothing of the entry, so a failed commit
    /// never reappears on replay.
    pub fn append_synced(&mut self, operation: Operation) -> Result<u64> {
        self.append_inner(operation, true)
    }

    fn append_inner(&mut self, operation: Operation, sync: bool) -> Result<u64> {
        let tail = self.tail();
        let lsn = self.write_entry(operation, tail)?;

        if sync {
            if let Err(e) = self.sync() {
                self.rewind(tail);
                return Err(e);
            }
        }
        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.sync_file()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Get the LSN the next entry will receive
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Entries appended since the last fsync
    pub fn uncommitted_count(&self) -> usize {
        self.unsynced
    }

    /// Length of the file up to the last complete entry
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn tail(&self) -> Tail {
        Tail {
            len: self.len,
            next_lsn: self.next_lsn,
            unsynced: self.unsynced,
        }
    }

    /// Drop everything written after `tail`
    fn rewind(&mut self, tail: Tail) {
        if let Err(e) = self.file.set_len(tail.len) {
            warn!(error = %e, len = tail.len, "failed to trim unsynced log entry");
        }
        self.len = tail.len;
        self.next_lsn = tail.next_lsn;
        self.unsynced = tail.unsynced;
    }

    fn write_entry(&mut self, operation: Operation, tail: Tail) -> Result<u64> {
        let lsn = self.next_lsn;
        let bytes = WalEntry::new(lsn, operation).serialize()?;

        if let Err(e) = self.file.write_all(&bytes) {
            // Cut off whatever part of the entry made it out, so the next
            // append does not land behind garbage.
            self.rewind(tail);
            return Err(e.into());
        }

        self.len += bytes.len() as u64;
        self.next_lsn += 1;
        self.unsynced += 1;
        Ok(lsn)
    }

    #[cfg(not(test))]
    fn sync_file(&self) -> io::Result<()> {
        self.file.sync_data()
    }

    #[cfg(test)]
    fn sync_file(&self) -> io::Result<()> {
        if self.fail_sync {
            return Err(io::Error::new(io::ErrorKind::Other, "sync failed"));
        }
        self.file.sync_data()
    }
}
