//! Store
//!
//! A [`KeyValue`] over one engine handle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::engine::{Engine, EngineOptions, FileEngine};
use crate::error::{KvError, Result};
use crate::lock::Locker;
use crate::sorted::{Batch, BatchMutation, KeyValue, Mutation, RangeIterator};

use super::Iter;

/// Sorted key-value store backed by a single file
///
/// ## Concurrency
/// - `commit_batch` calls are serialized by `txmu`; one engine transaction
///   at a time
/// - `get`/`set`/`delete`/`find` go straight to the engine and never wait
///   for a batch; a `set` made during a batch is durable and visible on
///   return, and a failing batch does not take it down
///
/// Share a store between threads with `Arc<Store>`.
pub struct Store {
    /// Path of the backing file
    path: PathBuf,

    engine: Box<dyn Engine>,

    /// Serializes batch commits
    txmu: Mutex<()>,
}

impl Store {
    /// Open the store described by `config`, creating the file if missing
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        Self::open_with_options(&config.file, EngineOptions::from(config))
    }

    /// Like [`open`](Store::open), taking the lock through `locker`
    pub fn open_with_locker(config: &Config, locker: Arc<dyn Locker>) -> Result<Self> {
        config.validate()?;
        let options = EngineOptions {
            locker,
            ..EngineOptions::from(config)
        };
        Self::open_with_options(&config.file, options)
    }

    /// Open or create the file at `path` with default settings
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path.as_ref(), EngineOptions::default())
    }

    fn open_with_options(path: &Path, options: EngineOptions) -> Result<Self> {
        let engine = if path.exists() {
            FileEngine::open(path, options)?
        } else {
            FileEngine::create(path, options)?
        };
        Ok(Self::from_engine(path, Box::new(engine)))
    }

    /// Wrap an already-open engine
    pub fn from_engine(path: impl Into<PathBuf>, engine: Box<dyn Engine>) -> Self {
        Self {
            path: path.into(),
            engine,
            txmu: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Range scan returning the concrete iterator type
    pub fn scan(&self, start: &[u8], end: &[u8]) -> Iter {
        Iter::new(self.engine.seek(start), end.to_vec())
    }

    /// Stage one batch mutation in the open transaction
    fn apply(&self, mutation: &Mutation) -> Result<()> {
        match mutation {
            Mutation::Set { key, value } => self.engine.set_in_tx(key, value),
            Mutation::Delete { key } => self.engine.delete_in_tx(key),
        }
    }
}

impl KeyValue for Store {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.engine.get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.engine.set(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.engine.delete(key)
    }

    fn find(&self, start: &[u8], end: &[u8]) -> Box<dyn RangeIterator + Send> {
        Box::new(self.scan(start, end))
    }

    fn begin_batch(&self) -> Box<dyn BatchMutation> {
        Box::new(Batch::new())
    }

    fn commit_batch(&self, batch: Box<dyn BatchMutation>) -> Result<()> {
        let batch = batch
            .into_any()
            .downcast::<Batch>()
            .map_err(|_| KvError::InvalidBatch)?;

        let _serialized = self.txmu.lock();

        let tx = Transaction::begin(self.engine.as_ref())?;
        for mutation in batch.mutations() {
            self.apply(mutation)?;
        }
        tx.commit()?;

        debug!(path = %self.path.display(), mutations = batch.len(), "committed batch");
        Ok(())
    }

    fn close(&self) -> Result<()> {
        info!(path = %self.path.display(), "closing kvfile database");
        self.engine.close()
    }
}

/// An open engine transaction, rolled back on drop unless committed
struct Transaction<'a> {
    engine: &'a dyn Engine,
    committed: bool,
}

impl<'a> Transaction<'a> {
    fn begin(engine: &'a dyn Engine) -> Result<Self> {
        engine.begin_transaction()?;
        Ok(Self {
            engine,
            committed: false,
        })
    }

    fn commit(mut self) -> Result<()> {
        self.engine.commit()?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match self.engine.rollback() {
            Ok(()) => debug!("rolled back batch"),
            Err(e) => warn!(error = %e, "rollback failed"),
        }
    }
}
