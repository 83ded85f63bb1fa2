//! Sharded index implementation

use std::collections::HashMap;

use bytes::Bytes;
use dashmap::DashMap;

/// Concurrent key → value map with per-shard locking
pub struct ShardedIndex {
    map: DashMap<Bytes, Bytes>,
    /// Shard count handed to the map (a power of two, at least 2)
    shards: usize,
}

impl ShardedIndex {
    /// Create an empty index with `shards` rounded up to a power of two
    pub fn new(shards: usize) -> Self {
        let shards = shards.max(2).next_power_of_two();
        Self {
            map: DashMap::with_shard_amount(shards),
            shards,
        }
    }

    /// Current value for `key`, if any
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.map.get(key).map(|entry| entry.value().clone())
    }

    /// Insert or overwrite; returns the previous value
    pub fn put(&self, key: Bytes, value: Bytes) -> Option<Bytes> {
        self.map.insert(key, value)
    }

    /// Values of every key starting with `prefix`, in no particular order
    ///
    /// The map iterator read-locks one shard at a time, so a `put` racing with
    /// the scan may or may not be observed. There is no scan-wide snapshot.
    pub fn prefix_scan(&self, prefix: &[u8]) -> Vec<Bytes> {
        self.map
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Copy of all pairs, taken shard by shard with the same guarantees as
    /// `prefix_scan`
    pub fn snapshot(&self) -> HashMap<Bytes, Bytes> {
        self.map
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn shard_count(&self) -> usize {
        self.shards
    }
}

impl Default for ShardedIndex {
    fn default() -> Self {
        Self::new(64)
    }
}
