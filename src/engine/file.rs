//! File Engine
//!
//! A single-file engine: an append-only log replayed into a memtable.
//!
//! ## Responsibilities
//! - Create or open the data file under an exclusive advisory lock
//! - Recover the memtable from the log on open
//! - Log every write before it becomes visible
//! - Stage transactional writes and log each commit as one entry
//! - Keep plain writes out of an open transaction

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::{Config, SyncStrategy};
use crate::error::{KvError, Result};
use crate::lock::{self, FlockLocker, LockGuard, Locker};
use crate::memtable::MemTable;
use crate::wal::{Operation, WalRecovery, WalWriter};

use super::{Cursor, Engine, TableCursor};

/// How a [`FileEngine`] syncs and locks
#[derive(Clone)]
pub struct EngineOptions {
    pub sync_strategy: SyncStrategy,
    pub locker: Arc<dyn Locker>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            sync_strategy: SyncStrategy::default(),
            locker: Arc::new(FlockLocker),
        }
    }
}

impl From<&Config> for EngineOptions {
    fn from(config: &Config) -> Self {
        Self {
            sync_strategy: config.sync_strategy,
            ..Self::default()
        }
    }
}

impl std::fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineOptions")
            .field("sync_strategy", &self.sync_strategy)
            .finish_non_exhaustive()
    }
}

/// The bundled storage engine
///
/// ## Concurrency Model
///
/// - **Reads** (get/seek): read lock on the memtable only
/// - **Writes** (set/delete/commit): `tx` lock → `wal` lock → memtable
///   write lock, always in that order
/// - `set_in_tx`/`delete_in_tx` stage into `tx`; staged writes are not
///   visible to readers until commit (read-committed)
/// - Plain `set`/`delete` are logged and applied at once, even while a
///   transaction is open
pub struct FileEngine {
    path: PathBuf,

    /// Ordered image of every committed key
    table: MemTable,

    /// The data file
    wal: Mutex<WalWriter>,

    /// Staged operations of the open transaction, if any
    tx: Mutex<Option<Vec<Operation>>>,

    /// Exclusive lock on `<path>.lock`; dropped on close
    lock: Mutex<Option<LockGuard>>,

    /// Shared with cursors so they fail once the engine is closed
    closed: Arc<AtomicBool>,
}

impl FileEngine {
    /// Create a new data file. Fails if `path` already exists.
    pub fn create(path: &Path, options: EngineOptions) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let guard = acquire_lock(path, options.locker.as_ref())?;
        OpenOptions::new().write(true).create_new(true).open(path)?;

        info!(path = %path.display(), "created data file");
        Self::start(path, options.sync_strategy, guard)
    }

    /// Open an existing data file, replaying its log
    pub fn open(path: &Path, options: EngineOptions) -> Result<Self> {
        let guard = acquire_lock(path, options.locker.as_ref())?;
        // Surface a missing file as NotFound rather than creating it.
        fs::metadata(path)?;

        Self::start(path, options.sync_strategy, guard)
    }

    /// Open `path`, creating it first if it does not exist
    pub fn open_or_create(path: &Path, options: EngineOptions) -> Result<Self> {
        if path.exists() {
            Self::open(path, options)
        } else {
            Self::create(path, options)
        }
    }

    fn start(path: &Path, sync_strategy: SyncStrategy, guard: LockGuard) -> Result<Self> {
        let (entries, recovery) = WalRecovery::recover(path)?;

        let table = MemTable::new();
        for entry in entries {
            table.apply(entry.operation);
        }

        info!(
            path = %path.display(),
            entries = recovery.entries_recovered,
            keys = table.entry_count(),
            bytes = table.size(),
            last_lsn = recovery.last_lsn,
            truncated = recovery.was_truncated,
            "opened data file"
        );

        let wal = WalWriter::resume(path, sync_strategy, recovery.last_lsn)?;

        Ok(Self {
            path: path.to_path_buf(),
            table,
            wal: Mutex::new(wal),
            tx: Mutex::new(None),
            lock: Mutex::new(Some(guard)),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Path of the data file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of live keys
    pub fn key_count(&self) -> usize {
        self.table.entry_count()
    }

    /// Whether a transaction is open
    pub fn in_transaction(&self) -> bool {
        self.tx.lock().is_some()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(KvError::Closed);
        }
        Ok(())
    }

    /// Log `op` and apply it to the table
    fn write(&self, op: Operation) -> Result<()> {
        // Checked under the tx lock so close() cannot slip in between.
        let _tx = self.tx.lock();
        self.ensure_open()?;

        self.wal.lock().append(op.clone())?;
        self.table.apply(op);
        Ok(())
    }

    /// Add `op` to the open transaction's write set
    fn stage(&self, op: Operation) -> Result<()> {
        let mut tx = self.tx.lock();
        self.ensure_open()?;

        let staged = tx
            .as_mut()
            .ok_or_else(|| KvError::Transaction("no active transaction".to_string()))?;
        staged.push(op);
        Ok(())
    }
}

fn acquire_lock(path: &Path, locker: &dyn Locker) -> Result<LockGuard> {
    let lock_path = lock::lock_path(path);
    locker
        .lock(&lock_path)
        .map_err(|source| KvError::Lock {
            path: lock_path,
            source,
        })
}

impl Engine for FileEngine {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.ensure_open()?;
        Ok(self.table.get(key))
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write(Operation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.write(Operation::Delete { key: key.to_vec() })
    }

    fn set_in_tx(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.stage(Operation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    fn delete_in_tx(&self, key: &[u8]) -> Result<()> {
        self.stage(Operation::Delete { key: key.to_vec() })
    }

    fn seek(&self, start: &[u8]) -> Result<Box<dyn Cursor>> {
        self.ensure_open()?;
        Ok(Box::new(TableCursor::new(
            self.table.clone(),
            start,
            Arc::clone(&self.closed),
        )))
    }

    fn begin_transaction(&self) -> Result<()> {
        let mut tx = self.tx.lock();
        self.ensure_open()?;

        if tx.is_some() {
            return Err(KvError::Transaction("transaction already active".to_string()));
        }
        *tx = Some(Vec::new());
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let mut tx = self.tx.lock();
        self.ensure_open()?;

        let operations = tx
            .take()
            .ok_or_else(|| KvError::Transaction("no active transaction".to_string()))?;

        if operations.is_empty() {
            return Ok(());
        }

        let count = operations.len();
        let batch = Operation::Batch { operations };
        if let Err(e) = self.wal.lock().append_synced(batch.clone()) {
            // Keep the transaction open so the caller can roll it back.
            if let Operation::Batch { operations } = batch {
                *tx = Some(operations);
            }
            return Err(e);
        }

        self.table.apply(batch);
        debug!(operations = count, "committed transaction");
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        let mut tx = self.tx.lock();
        let operations = tx
            .take()
            .ok_or_else(|| KvError::Transaction("no active transaction".to_string()))?;

        debug!(operations = operations.len(), "rolled back transaction");
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut tx = self.tx.lock();
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        if let Some(staged) = tx.take() {
            warn!(operations = staged.len(), "discarding open transaction on close");
        }

        drop(tx);

        let synced = self.wal.lock().sync();
        // Release the lock even if the final sync failed.
        self.lock.lock().take();
        synced
    }
}

impl Drop for FileEngine {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(path = %self.path.display(), error = %e, "failed to close data file");
        }
    }
}
