//! MemTable Module
//!
//! The ordered in-memory image of the data file.
//!
//! ## Responsibilities
//! - Hold every live key/value, ordered byte-wise
//! - Serve point lookups and cursor steps under a read lock
//! - Apply logged operations after they are durable
//! - Track approximate size for diagnostics
//!
//! ## Data Structure Choice
//! A BTreeMap behind a parking_lot RwLock, shared through an Arc so cursors
//! can outlive the borrow that created them. Deleted keys are removed
//! outright: the log is the only persistent copy, so no tombstones are kept.

mod table;

pub use table::MemTable;
