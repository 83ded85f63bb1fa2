//! Index Module
//!
//! In-memory map from key to current value, rebuilt from the log at startup.
//!
//! ## Responsibilities
//! - Point lookups that never wait on the engine's write gate
//! - Insert-or-overwrite per key (last writer wins)
//! - Prefix scans over the whole map
//!
//! ## Data Structure Choice
//! A `DashMap`: a fixed array of read/write-locked hash shards selected by
//! key hash. Readers and writers of different shards never contend; a reader
//! of a shard only waits for the duration of a single insert.

mod sharded;

pub use sharded::ShardedIndex;
