//! MemTable implementation
//!
//! BTreeMap-based memtable with RwLock for concurrency.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::wal::Operation;

#[derive(Default)]
struct Table {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Sum of key and value lengths
    size: usize,
}

impl Table {
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        let key_len = key.len();
        let value_len = value.len();
        match self.data.insert(key, value) {
            // Key bytes are already counted; only the value changes.
            Some(old) => self.size = self.size - old.len() + value_len,
            None => self.size += key_len + value_len,
        }
    }

    fn remove(&mut self, key: &[u8]) {
        if let Some(old) = self.data.remove(key) {
            self.size -= key.len() + old.len();
        }
    }
}

/// In-memory ordered table
///
/// Cloning is cheap and yields a handle to the same table.
#[derive(Clone, Default)]
pub struct MemTable {
    inner: Arc<RwLock<Table>>,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.read().data.get(key).cloned()
    }

    /// Apply a logged operation, replaying batches in order
    ///
    /// The whole operation is applied under one write lock, so readers never
    /// observe half of a batch.
    pub fn apply(&self, operation: Operation) {
        let mut table = self.inner.write();
        apply_to(&mut table, operation);
    }

    /// First entry at or after `from`, in key order (read lock)
    ///
    /// Cursors call this once per step so the lock is never held between
    /// steps.
    pub fn first_from(&self, from: Bound<&[u8]>) -> Option<(Vec<u8>, Vec<u8>)> {
        self.inner
            .read()
            .data
            .range::<[u8], _>((from, Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.clone(), v.clone()))
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.inner.read().size
    }

    /// Get entry count
    pub fn entry_count(&self) -> usize {
        self.inner.read().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().data.is_empty()
    }
}

fn apply_to(table: &mut Table, operation: Operation) {
    match operation {
        Operation::Put { key, value } => table.put(key, value),
        Operation::Delete { key } => table.remove(&key),
        Operation::Batch { operations } => {
            for op in operations {
                apply_to(table, op);
            }
        }
    }
}
