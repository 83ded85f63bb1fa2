//! # DuraKV
//!
//! A durable, single-node key-value store with:
//! - An append-only write-ahead log, flushed before every acknowledgement
//! - Crash recovery that replays the log and truncates a torn tail
//! - A sharded in-memory index for non-blocking reads
//! - TCP-based client protocol with streaming prefix and multi-key reads
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │               (one thread per connection)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │            (Single Writer / Multi Reader)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │ set                     │ set / get / scan
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │     WAL     │─replay──▶│ ShardedIndex │
//!   │  (Append)   │          │   DashMap    │
//!   └─────────────┘          └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod index;
pub mod network;
pub mod protocol;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result, WriteStage};
pub use config::{Config, FlushStrategy};
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of DuraKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
