//! Store Module
//!
//! The adapter from the [`KeyValue`](crate::sorted::KeyValue) contract onto
//! an [`Engine`](crate::engine::Engine).
//!
//! ## Responsibilities
//! - Open or create the data file and hold its lock until close
//! - Pass single-key operations straight to the engine
//! - Run each batch as one engine transaction, serialized per store, rolled
//!   back on any failure
//! - Wrap engine cursors in bounded, string-caching range iterators

mod iter;
mod kvfile;

pub use iter::Iter;
pub use kvfile::Store;
