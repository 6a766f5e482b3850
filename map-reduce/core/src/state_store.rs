// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::store_error::StoreError;

/// Trait for the accumulator map workers emit into
/// Abstracts the storage mechanism away from the job definitions
pub trait StateStore<V>: Clone + Send + Sync + 'static {
    /// Append `value` to the list for `key`, creating the entry if needed
    ///
    /// The whole operation is atomic: on error the store is left unchanged.
    fn emit(&self, key: &str, value: V) -> Result<(), StoreError>;
}

/// One key with every value emitted for it, in emit order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry<V> {
    pub key: String,
    pub values: Vec<V>,
}

/// The store contents handed to reduce once all mappers have joined
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot<V> {
    entries: Vec<StoreEntry<V>>,
}

impl<V> StoreSnapshot<V> {
    pub(crate) fn new(entries: Vec<StoreEntry<V>>) -> Self {
        Self { entries }
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-emit order of their keys
    pub fn entries(&self) -> &[StoreEntry<V>] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&[V]> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.values.as_slice())
    }

    /// Total number of values across all keys
    pub fn value_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.values.len()).sum()
    }
}

impl<V> IntoIterator for StoreSnapshot<V> {
    type Item = StoreEntry<V>;
    type IntoIter = std::vec::IntoIter<StoreEntry<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
