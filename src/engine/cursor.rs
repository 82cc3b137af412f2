//! Memtable cursor
//!
//! Steps through a [`MemTable`] in key order without holding its lock
//! between steps. Each step looks up the first key after the last one
//! returned, so writes committed after the seek are seen if they land ahead
//! of the cursor.

use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{KvError, Result};
use crate::memtable::MemTable;

use super::Cursor;

/// Forward cursor over a [`MemTable`]
pub struct TableCursor {
    table: MemTable,
    /// Lower bound of the next step
    from: Bound<Vec<u8>>,
    /// Engine's closed flag
    closed: Arc<AtomicBool>,
    exhausted: bool,
}

impl TableCursor {
    pub(crate) fn new(table: MemTable, start: &[u8], closed: Arc<AtomicBool>) -> Self {
        Self {
            table,
            from: Bound::Included(start.to_vec()),
            closed,
            exhausted: false,
        }
    }
}

impl Cursor for TableCursor {
    fn next(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(KvError::Closed);
        }
        if self.exhausted {
            return Ok(None);
        }

        let from = match &self.from {
            Bound::Included(k) => Bound::Included(k.as_slice()),
            Bound::Excluded(k) => Bound::Excluded(k.as_slice()),
            Bound::Unbounded => Bound::Unbounded,
        };

        match self.table.first_from(from) {
            Some((key, value)) => {
                self.from = Bound::Excluded(key.clone());
                Ok(Some((key, value)))
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }
}
