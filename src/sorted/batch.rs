//! Batch mutations
//!
//! An ordered list of pending writes. Nothing touches storage until the
//! batch is committed; later mutations of a key win because they replay
//! later.

use std::any::Any;

use super::BatchMutation;

/// One pending write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Set { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl Mutation {
    pub fn key(&self) -> &[u8] {
        match self {
            Mutation::Set { key, .. } | Mutation::Delete { key } => key,
        }
    }

    /// The value to store; `None` for a delete
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            Mutation::Set { value, .. } => Some(value),
            Mutation::Delete { .. } => None,
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Mutation::Delete { .. })
    }
}

/// The batch type produced by [`KeyValue::begin_batch`](super::KeyValue::begin_batch)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    mutations: Vec<Mutation>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutations in the order they were added
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

impl BatchMutation for Batch {
    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.mutations.push(Mutation::Set {
            key: key.to_vec(),
            value: value.to_vec(),
        });
    }

    fn delete(&mut self, key: &[u8]) {
        self.mutations.push(Mutation::Delete { key: key.to_vec() });
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}
