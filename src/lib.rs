//! # kvfile
//!
//! A sorted key-value store kept in a single local file:
//! - Byte-ordered keys with point reads, writes and range scans
//! - Atomic batches that either fully apply or leave no trace
//! - Append-only log with crash recovery of torn writes
//! - Advisory `<file>.lock` so only one process owns the file
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  KeyValue / RangeIterator                    │
//! │                    (sorted contract)                         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Store                                 │
//! │        (batch mutex, rollback guard, bounded iterators)      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ dyn Engine
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     FileEngine                               │
//! │          (transactions, cursors, lock, lifecycle)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     Log     │          │  MemTable   │
//!   │  (Append)   │          │  (RwLock)   │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use kvfile::{BatchMutation, Config, KeyValue, RangeIterator, Store};
//!
//! # fn main() -> kvfile::Result<()> {
//! let store = Store::open(&Config::builder().file("/tmp/index.db").build())?;
//!
//! let mut batch = store.begin_batch();
//! batch.set(b"a", b"1");
//! batch.set(b"b", b"2");
//! store.commit_batch(batch)?;
//!
//! let mut it = store.find(b"a", b"");
//! while it.next() {
//!     println!("{} = {}", it.key(), it.value());
//! }
//! it.close()?;
//!
//! store.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod lock;

pub mod wal;
pub mod memtable;
pub mod engine;

pub mod sorted;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::{Config, SyncStrategy};
pub use lock::Locker;
pub use engine::{Cursor, Engine, EngineOptions, FileEngine};
pub use sorted::{Batch, BatchMutation, KeyValue, Mutation, RangeIterator};
pub use store::{Iter, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvfile
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
