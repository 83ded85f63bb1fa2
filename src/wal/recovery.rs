//! WAL Recovery
//!
//! Rebuilds the index by replaying the log and cuts off a torn tail.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{KvError, Result};
use crate::index::ShardedIndex;

use super::{LogReader, LogStorage, ReadOutcome};

/// Why a replay stopped
#[derive(Debug)]
pub enum StopReason {
    /// End of file exactly at an entry boundary
    CleanEnd,

    /// Header, key or value was short
    TornEntry,

    /// The reader failed; handled exactly like a torn entry
    ReadError(std::io::Error),
}

/// Outcome of a single replay pass
#[derive(Debug)]
pub struct Replay {
    /// Offset up to which every entry is complete
    pub consistent_offset: u64,

    /// Entries applied to the index
    pub entries: u64,

    pub stop: StopReason,
}

/// Result of a recovery (or verification) run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Number of complete entries replayed
    pub entries_replayed: u64,

    /// Offset of the end of the last complete entry
    pub consistent_offset: u64,

    /// File length before any truncation
    pub file_len: u64,

    /// Bytes past `consistent_offset` that did not form an entry
    pub bytes_discarded: u64,

    /// Whether a torn tail (or read error) ended the scan
    pub torn_tail: bool,

    /// Whether the file was actually truncated
    pub truncated: bool,

    /// Distinct keys in the rebuilt index
    pub distinct_keys: usize,
}

/// Handles log replay after a restart
pub struct Recovery;

impl Recovery {
    /// Replay every complete entry from `reader` into `index`
    ///
    /// Entries are applied in log order, so the last entry for a key wins.
    pub fn replay_all<R: Read>(reader: &mut LogReader<R>, index: &ShardedIndex) -> Replay {
        let mut entries = 0u64;

        let stop = loop {
            match reader.next_entry() {
                Ok(ReadOutcome::Entry(entry)) => {
                    index.put(entry.key, entry.value);
                    entries += 1;
                }
                Ok(ReadOutcome::End) => break StopReason::CleanEnd,
                Ok(ReadOutcome::Torn { bytes_present }) => {
                    tracing::warn!(
                        "Torn log entry at offset {} ({} bytes present)",
                        reader.offset(),
                        bytes_present
                    );
                    break StopReason::TornEntry;
                }
                Err(KvError::LogRead(e)) => {
                    tracing::warn!("Log read failed at offset {}: {}", reader.offset(), e);
                    break StopReason::ReadError(e);
                }
                Err(e) => {
                    tracing::warn!("Log read failed at offset {}: {}", reader.offset(), e);
                    break StopReason::ReadError(std::io::Error::other(e.to_string()));
                }
            }
        };

        Replay {
            consistent_offset: reader.offset(),
            entries,
            stop,
        }
    }

    /// Rebuild `index` from `storage` and truncate anything past the last
    /// complete entry
    pub fn recover(storage: &mut LogStorage, index: &ShardedIndex) -> Result<RecoveryReport> {
        let mut reader = storage.open_for_read()?;
        let replay = Self::replay_all(&mut reader, index);
        drop(reader);

        let file_len = storage.file_len()?;
        let mut report = Self::report(&replay, file_len, index);

        if file_len > replay.consistent_offset {
            tracing::warn!(
                "Truncating log {} from {} to {} bytes",
                storage.path().display(),
                file_len,
                replay.consistent_offset
            );
            storage.truncate(replay.consistent_offset)?;
            report.truncated = true;
        }

        tracing::info!(
            "Recovered {} entries ({} keys) from {}",
            report.entries_replayed,
            report.distinct_keys,
            storage.path().display()
        );

        Ok(report)
    }

    /// Scan a log file without modifying it and report what recovery would do
    pub fn verify(path: &Path) -> Result<RecoveryReport> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        let index = ShardedIndex::new(16);
        let mut reader = LogReader::new(BufReader::new(file));
        let replay = Self::replay_all(&mut reader, &index);

        Ok(Self::report(&replay, file_len, &index))
    }

    fn report(replay: &Replay, file_len: u64, index: &ShardedIndex) -> RecoveryReport {
        RecoveryReport {
            entries_replayed: replay.entries,
            consistent_offset: replay.consistent_offset,
            file_len,
            bytes_discarded: file_len.saturating_sub(replay.consistent_offset),
            torn_tail: !matches!(replay.stop, StopReason::CleanEnd),
            truncated: false,
            distinct_keys: index.len(),
        }
    }
}
