//! Sorted key-value contract
//!
//! The storage-agnostic interface indexers program against:
//!
//! - [`KeyValue`]: point reads and writes, range scans and atomic batches
//! - [`RangeIterator`]: the forward cursor returned by [`KeyValue::find`]
//! - [`BatchMutation`]: pending writes submitted through
//!   [`KeyValue::commit_batch`]
//!
//! Keys compare byte-wise.

mod batch;

pub use batch::{Batch, Mutation};

use std::any::Any;

use crate::error::Result;

/// A sorted, byte-keyed key-value store
pub trait KeyValue: Send + Sync {
    /// Value stored under `key`; `Ok(None)` if there is none.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key` immediately, outside any batch.
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove `key` immediately. Absent keys are not an error.
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Iterate keys in `[start, end)` in ascending order. An empty `end`
    /// means no upper bound.
    ///
    /// Errors, including a failed seek, are reported by
    /// [`RangeIterator::close`].
    fn find(&self, start: &[u8], end: &[u8]) -> Box<dyn RangeIterator + Send>;

    /// A new, empty batch for [`commit_batch`](KeyValue::commit_batch).
    fn begin_batch(&self) -> Box<dyn BatchMutation>;

    /// Apply every mutation in `batch`, in order, atomically.
    ///
    /// On error nothing in the batch has taken effect.
    fn commit_batch(&self, batch: Box<dyn BatchMutation>) -> Result<()>;

    /// Release the store. Using it afterwards fails.
    fn close(&self) -> Result<()>;
}

/// A forward iterator over a key range
///
/// ```text
/// let mut it = kv.find(b"a", b"");
/// while it.next() {
///     println!("{} = {}", it.key(), it.value());
/// }
/// it.close()?;
/// ```
///
/// The accessors may only be called after `next` returned `true`; calling
/// them at any other time, or calling `next` again after it returned
/// `false`, is a bug in the caller and panics.
pub trait RangeIterator {
    /// Advance to the next entry. `false` once the range is exhausted or an
    /// error occurred.
    fn next(&mut self) -> bool;

    /// Raw bytes of the current key
    fn key_bytes(&self) -> &[u8];

    /// Raw bytes of the current value
    fn value_bytes(&self) -> &[u8];

    /// Current key as a string, decoded once per position
    fn key(&self) -> &str;

    /// Current value as a string, decoded once per position
    fn value(&self) -> &str;

    /// Stop iterating and report any error hit along the way.
    ///
    /// Safe to call more than once; the error is returned by the first call.
    fn close(&mut self) -> Result<()>;
}

/// Writes collected for one atomic commit
pub trait BatchMutation: Send {
    fn set(&mut self, key: &[u8], value: &[u8]);

    fn delete(&mut self, key: &[u8]);

    /// Recover the concrete batch type inside `commit_batch`.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}
