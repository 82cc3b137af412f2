//! Engine Module
//!
//! The transactional sorted storage a [`Store`](crate::store::Store) drives.
//!
//! ## Contract
//! - Keys and values are raw bytes, ordered byte-wise
//! - `get` / `set` / `delete` act on single keys and take effect at once,
//!   whether or not a transaction is open
//! - `seek` returns a forward cursor positioned at the first key >= start
//! - `begin_transaction` / `commit` / `rollback` scope one transaction per
//!   handle; only `set_in_tx` / `delete_in_tx` write into it
//! - `close` releases the file and its lock; later calls fail with
//!   [`KvError::Closed`](crate::KvError::Closed)
//!
//! [`FileEngine`] is the bundled implementation.

mod cursor;
mod file;

pub use cursor::TableCursor;
pub use file::{EngineOptions, FileEngine};

use crate::error::Result;

/// A transactional, byte-ordered key-value engine
pub trait Engine: Send + Sync {
    /// Look up `key`. `Ok(None)` when absent.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove `key`. Removing an absent key succeeds.
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Stage a write in the open transaction.
    ///
    /// Fails with [`KvError::Transaction`](crate::KvError::Transaction) when
    /// no transaction is open.
    fn set_in_tx(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Stage a removal in the open transaction.
    fn delete_in_tx(&self, key: &[u8]) -> Result<()>;

    /// Open a forward cursor at the first key >= `start`.
    fn seek(&self, start: &[u8]) -> Result<Box<dyn Cursor>>;

    /// Start a transaction. Fails if one is already open.
    fn begin_transaction(&self) -> Result<()>;

    /// Make the open transaction's writes durable and visible.
    fn commit(&self) -> Result<()>;

    /// Discard the open transaction's writes.
    fn rollback(&self) -> Result<()>;

    /// Flush and release the engine. Closing twice is a no-op.
    fn close(&self) -> Result<()>;
}

/// A forward cursor over an engine's keys
pub trait Cursor: Send {
    /// The next entry, `Ok(None)` at end of data.
    fn next(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>>;
}
