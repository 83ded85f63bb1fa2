//! Write-Ahead Log (WAL) Module
//!
//! Durable, append-only record of every `Set`. The in-memory index is always
//! rebuilt from this file at startup.
//!
//! ## Responsibilities
//! - Append entries as one contiguous frame
//! - Flush to stable storage before a write is acknowledged
//! - Sequential scan from offset 0 for recovery
//! - Truncate a torn trailing entry after a crash
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │ Entry 1                                          │
//! │ ┌────────────┬────────────┬────────┬──────────┐  │
//! │ │ KeyLen (8) │ ValLen (8) │  Key   │  Value   │  │
//! │ └────────────┴────────────┴────────┴──────────┘  │
//! ├──────────────────────────────────────────────────┤
//! │ Entry 2 ...                                      │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Lengths are little-endian `u64`. There is no checksum: a torn entry is
//! detected only because it is short, not because its bytes are wrong.

mod entry;
mod storage;
mod reader;
mod recovery;

pub use entry::{LogEntry, HEADER_SIZE};
pub use storage::{LogFile, LogStorage};
pub use reader::{LogReader, ReadOutcome};
pub use recovery::{Recovery, RecoveryReport, Replay, StopReason};
