//! Write-Ahead Log (WAL) Module
//!
//! The data file of a [`FileEngine`](crate::engine::FileEngine) is a single
//! append-only log. It is replayed into the memtable on open and never
//! checkpointed, so it is both the WAL and the store.
//!
//! ## Responsibilities
//! - Append entries before any mutation becomes visible
//! - CRC32 checksums for corruption detection
//! - Log Sequence Numbers (LSN) for ordering
//! - A committed batch is one entry, so it replays all-or-nothing
//! - Crash recovery: truncate a torn or corrupt tail
//!
//! ## Growth
//! The log is never compacted. Every overwrite and delete appends a record,
//! so the file size and the replay time on open grow with the write history,
//! not with the number of live keys.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Entry 1                                 │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Entry 2                                 │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! └─────────────────────────────────────────┘
//! ```
//! All integers are little-endian. `Data` is the bincode encoding of the
//! [`WalEntry`]; the CRC covers `Data` only.

mod entry;
mod writer;
mod reader;
mod recovery;

pub use entry::{WalEntry, Operation, HEADER_SIZE, MAX_ENTRY_SIZE};
pub use writer::WalWriter;
pub use reader::{WalReader, WalIterator};
pub use recovery::{WalRecovery, RecoveryResult};
