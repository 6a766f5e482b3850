// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::config::ConfigError;
use crate::state_store::{StateStore, StoreEntry, StoreSnapshot};
use crate::store_error::StoreError;
use std::collections::{HashMap, TryReserveError};
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Capacity policy for the in-memory store
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreConfig {
    initial_capacity: usize,
    growth_ratio: f64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
            growth_ratio: Self::DEFAULT_GROWTH_RATIO,
        }
    }
}

impl StoreConfig {
    pub const DEFAULT_INITIAL_CAPACITY: usize = 64;
    pub const DEFAULT_GROWTH_RATIO: f64 = 1.25;

    pub fn new(initial_capacity: usize, growth_ratio: f64) -> Result<Self, ConfigError> {
        if initial_capacity == 0 {
            return Err(ConfigError::ZeroInitialCapacity);
        }
        if !growth_ratio.is_finite() || growth_ratio < 1.0 {
            return Err(ConfigError::InvalidGrowthRatio(growth_ratio));
        }
        Ok(Self {
            initial_capacity,
            growth_ratio,
        })
    }

    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    pub fn growth_ratio(&self) -> f64 {
        self.growth_ratio
    }

    /// Next capacity after `capacity` is exhausted; always strictly larger
    pub fn grow(&self, capacity: usize) -> usize {
        // Float to int casts saturate, so a huge product clamps to usize::MAX.
        let scaled = (capacity as f64 * self.growth_ratio).ceil() as usize;
        scaled.max(capacity.saturating_add(1))
    }
}

struct Inner<V> {
    /// Key to slot in `values`; slots are assigned densely in first-emit order
    index: HashMap<String, usize>,
    values: Vec<Vec<V>>,
    capacity: usize,
}

impl<V> Inner<V> {
    fn emit(&mut self, key: &str, value: V, config: &StoreConfig) -> Result<(), StoreError> {
        let alloc_error = |source: TryReserveError| StoreError::Allocation {
            key: key.to_string(),
            source,
        };

        if let Some(&slot) = self.index.get(key) {
            let list = &mut self.values[slot];
            list.try_reserve(1).map_err(alloc_error)?;
            list.push(value);
            return Ok(());
        }

        // Every reservation for a new key happens before anything is inserted,
        // so a failure leaves the store exactly as it was.
        let slot = self.values.len();
        let capacity = if slot >= self.capacity {
            config.grow(self.capacity)
        } else {
            self.capacity
        };
        if self.values.capacity() < capacity {
            self.values
                .try_reserve_exact(capacity - slot)
                .map_err(alloc_error)?;
        }
        self.index.try_reserve(1).map_err(alloc_error)?;

        let mut owned_key = String::new();
        owned_key.try_reserve_exact(key.len()).map_err(alloc_error)?;
        owned_key.push_str(key);

        let mut list = Vec::new();
        list.try_reserve_exact(1).map_err(alloc_error)?;
        list.push(value);

        if capacity != self.capacity {
            debug!(
                from = self.capacity,
                to = capacity,
                "store capacity exhausted, growing"
            );
            self.capacity = capacity;
        }
        self.index.insert(owned_key, slot);
        self.values.push(list);
        Ok(())
    }

    fn drain(&mut self) -> Vec<StoreEntry<V>> {
        let mut keys: Vec<(usize, String)> =
            self.index.drain().map(|(key, slot)| (slot, key)).collect();
        keys.sort_unstable_by_key(|(slot, _)| *slot);

        keys.into_iter()
            .zip(mem::take(&mut self.values))
            .map(|((_, key), values)| StoreEntry { key, values })
            .collect()
    }
}

/// Shared in-memory store using Arc<Mutex<...>>
///
/// Cloning is cheap and every clone points at the same data. A single lock
/// covers the whole store, so emits are globally serialized and the values
/// for one key appear in the order their emits acquired the lock.
pub struct InMemoryStateStore<V> {
    inner: Arc<Mutex<Inner<V>>>,
    config: StoreConfig,
}

impl<V> Clone for InMemoryStateStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: self.config,
        }
    }
}

impl<V> Default for InMemoryStateStore<V> {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl<V> InMemoryStateStore<V> {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                index: HashMap::new(),
                values: Vec::new(),
                capacity: config.initial_capacity(),
            })),
            config,
        }
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.read().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct keys the store can hold before growing again
    pub fn capacity(&self) -> usize {
        self.read().capacity
    }

    /// Number of handles sharing this store
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Take every entry out of the store, leaving it empty
    pub fn drain_snapshot(&self) -> Result<StoreSnapshot<V>, StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(StoreSnapshot::new(inner.drain()))
    }

    // Inspection only: a poisoned lock still holds consistent data because
    // every mutation is completed or skipped before the guard drops.
    fn read(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Clone> InMemoryStateStore<V> {
    /// Get all values for a key
    pub fn values(&self, key: &str) -> Option<Vec<V>> {
        let inner = self.read();
        inner
            .index
            .get(key)
            .map(|&slot| inner.values[slot].clone())
    }
}

impl<V: Send + 'static> StateStore<V> for InMemoryStateStore<V> {
    fn emit(&self, key: &str, value: V) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        inner.emit(key, value, &self.config)
    }
}
