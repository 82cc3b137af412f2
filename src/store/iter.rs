//! Range Iterator
//!
//! Bounded, forward-only iteration over an engine cursor.
//!
//! ## States
//! ```text
//!   Fresh ──next()──▶ Positioned ──next()──▶ Positioned ── … ──▶ Terminal
//!     │                                                             ▲
//!     └──────────────── next() / close() ───────────────────────────┘
//! ```
//! The current entry and its decoded strings only exist in `Positioned`.
//! `Terminal` is entered on end of data, on reaching the end bound, on a
//! cursor error (kept as the sticky error), or on `close`.

use std::cell::OnceCell;

use crate::engine::Cursor;
use crate::error::{KvError, Result};
use crate::sorted::RangeIterator;

/// The entry an iterator is positioned on
struct Entry {
    key: Vec<u8>,
    value: Vec<u8>,
    /// Decoded on first request; dropped with the entry on the next step
    key_str: OnceCell<String>,
    value_str: OnceCell<String>,
}

impl Entry {
    fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self {
            key,
            value,
            key_str: OnceCell::new(),
            value_str: OnceCell::new(),
        }
    }
}

enum State {
    Fresh,
    Positioned(Entry),
    Terminal,
}

/// Range iterator returned by [`Store::find`](crate::store::Store)
pub struct Iter {
    /// `None` once terminal, or if the seek failed
    cursor: Option<Box<dyn Cursor>>,
    /// Exclusive upper bound; empty means unbounded
    end: Vec<u8>,
    state: State,
    /// First error hit while iterating, reported by `close`
    err: Option<KvError>,
}

impl Iter {
    pub(crate) fn new(cursor: Result<Box<dyn Cursor>>, end: Vec<u8>) -> Self {
        let (cursor, err) = match cursor {
            Ok(cursor) => (Some(cursor), None),
            Err(e) => (None, Some(e)),
        };
        Self {
            cursor,
            end,
            state: State::Fresh,
            err,
        }
    }

    /// Whether the iterator can no longer advance
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, State::Terminal)
    }

    fn finish(&mut self) -> bool {
        self.state = State::Terminal;
        self.cursor = None;
        false
    }

    fn past_end(&self, key: &[u8]) -> bool {
        !self.end.is_empty() && key >= self.end.as_slice()
    }

    fn current(&self) -> &Entry {
        match &self.state {
            State::Positioned(entry) => entry,
            State::Fresh => panic!("iterator accessed before next() returned true"),
            State::Terminal => panic!("iterator accessed after iteration finished"),
        }
    }
}

impl RangeIterator for Iter {
    fn next(&mut self) -> bool {
        if self.is_terminal() {
            panic!("next called after iteration finished");
        }

        let Some(cursor) = self.cursor.as_mut() else {
            // Seek failed; the error is already recorded.
            return self.finish();
        };

        match cursor.next() {
            Ok(Some((key, value))) => {
                if self.past_end(&key) {
                    return self.finish();
                }
                self.state = State::Positioned(Entry::new(key, value));
                true
            }
            Ok(None) => self.finish(),
            Err(e) => {
                self.err = Some(e);
                self.finish()
            }
        }
    }

    fn key_bytes(&self) -> &[u8] {
        &self.current().key
    }

    fn value_bytes(&self) -> &[u8] {
        &self.current().value
    }

    fn key(&self) -> &str {
        let entry = self.current();
        entry
            .key_str
            .get_or_init(|| String::from_utf8_lossy(&entry.key).into_owned())
    }

    fn value(&self) -> &str {
        let entry = self.current();
        entry
            .value_str
            .get_or_init(|| String::from_utf8_lossy(&entry.value).into_owned())
    }

    fn close(&mut self) -> Result<()> {
        self.finish();
        match self.err.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
