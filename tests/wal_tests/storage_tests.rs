//! Tests for LogStorage
//!
//! These tests verify:
//! - Appending entries and the returned value offsets
//! - Flush under both strategies
//! - Reopening continues at the end of the file
//! - Truncation
//! - Write failures surface as LogWrite errors
//! - A failed append refuses every later append

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use durakv::config::FlushStrategy;
use durakv::index::ShardedIndex;
use durakv::wal::{LogEntry, LogFile, LogStorage, Recovery, HEADER_SIZE};
use durakv::{KvError, WriteStage};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("test.log");
    (temp_dir, log_path)
}

/// Log file that accepts only `space` more bytes, like a nearly full disk
struct LimitedFile {
    inner: File,
    space: Arc<AtomicUsize>,
}

impl LimitedFile {
    fn open(path: &Path, space: Arc<AtomicUsize>) -> Self {
        let inner = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        Self { inner, space }
    }
}

impl Write for LimitedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let space = self.space.load(Ordering::SeqCst);
        if space == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "no space left on device"));
        }
        let written = self.inner.write(&buf[..buf.len().min(space)])?;
        self.space.fetch_sub(written, Ordering::SeqCst);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl LogFile for LimitedFile {
    fn sync_data(&self) -> io::Result<()> {
        self.inner.sync_data()
    }

    fn sync_all(&self) -> io::Result<()> {
        self.inner.sync_all()
    }

    fn set_len(&self, len: u64) -> io::Result<()> {
        self.inner.set_len(len)
    }

    fn file_len(&self) -> io::Result<u64> {
        Ok(self.inner.metadata()?.len())
    }
}

// =============================================================================
// Append Tests
// =============================================================================

#[test]
fn test_open_creates_empty_file() {
    let (_temp, log_path) = setup_temp_log();

    let storage = LogStorage::open(&log_path, FlushStrategy::SyncData).unwrap();

    assert!(log_path.exists());
    assert_eq!(storage.len(), 0);
    assert!(storage.is_empty());
}

#[test]
fn test_append_returns_value_offset() {
    let (_temp, log_path) = setup_temp_log();
    let mut storage = LogStorage::open(&log_path, FlushStrategy::SyncData).unwrap();

    let first = storage.append(b"key1", b"value1").unwrap();
    assert_eq!(first, (HEADER_SIZE + 4) as u64);

    let second = storage.append(b"k2", b"v").unwrap();
    let first_len = (HEADER_SIZE + 4 + 6) as u64;
    assert_eq!(second, first_len + (HEADER_SIZE + 2) as u64);
    assert_eq!(storage.len(), first_len + (HEADER_SIZE + 2 + 1) as u64);
}

#[test]
fn test_append_writes_exact_frames() {
    let (_temp, log_path) = setup_temp_log();
    let mut storage = LogStorage::open(&log_path, FlushStrategy::SyncData).unwrap();

    storage.append(b"a", b"1").unwrap();
    storage.append(b"bb", b"22").unwrap();
    storage.flush().unwrap();

    let mut expected = LogEntry::new("a", "1").encode().to_vec();
    expected.extend_from_slice(&LogEntry::new("bb", "22").encode());

    assert_eq!(fs::read(&log_path).unwrap(), expected);
}

#[test]
fn test_flush_both_strategies() {
    for strategy in [FlushStrategy::SyncData, FlushStrategy::OsBuffer] {
        let (_temp, log_path) = setup_temp_log();
        let mut storage = LogStorage::open(&log_path, strategy).unwrap();

        storage.append(b"k", b"v").unwrap();
        storage.flush().unwrap();

        assert_eq!(storage.flush_strategy(), strategy);
        assert_eq!(fs::metadata(&log_path).unwrap().len(), storage.len());
    }
}

#[test]
fn test_reopen_appends_after_existing_entries() {
    let (_temp, log_path) = setup_temp_log();

    {
        let mut storage = LogStorage::open(&log_path, FlushStrategy::SyncData).unwrap();
        storage.append(b"k1", b"v1").unwrap();
        storage.flush().unwrap();
    }

    let mut storage = LogStorage::open(&log_path, FlushStrategy::SyncData).unwrap();
    let existing = storage.len();
    assert_eq!(existing, (HEADER_SIZE + 4) as u64);

    let offset = storage.append(b"k2", b"v2").unwrap();
    assert_eq!(offset, existing + (HEADER_SIZE + 2) as u64);

    let entries: Vec<_> = storage
        .open_for_read()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(entries, vec![LogEntry::new("k1", "v1"), LogEntry::new("k2", "v2")]);
}

// =============================================================================
// Truncate Tests
// =============================================================================

#[test]
fn test_truncate_then_append() {
    let (_temp, log_path) = setup_temp_log();
    let mut storage = LogStorage::open(&log_path, FlushStrategy::SyncData).unwrap();

    storage.append(b"keep", b"me").unwrap();
    let boundary = storage.len();
    storage.append(b"drop", b"me").unwrap();
    storage.flush().unwrap();

    storage.truncate(boundary).unwrap();
    assert_eq!(storage.len(), boundary);
    assert_eq!(storage.file_len().unwrap(), boundary);

    storage.append(b"next", b"one").unwrap();
    storage.flush().unwrap();

    let entries: Vec<_> = storage
        .open_for_read()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(entries, vec![LogEntry::new("keep", "me"), LogEntry::new("next", "one")]);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[cfg(target_os = "linux")]
#[test]
fn test_append_to_full_device_is_write_error() {
    let full = Path::new("/dev/full");
    if !full.exists() {
        return;
    }

    // /dev/full rejects every write with ENOSPC.
    let mut storage = LogStorage::open(full, FlushStrategy::OsBuffer).unwrap();

    let err = storage.append(b"key", b"value").unwrap_err();
    assert!(err.is_write_error());
    assert!(matches!(err, KvError::LogWrite { stage: WriteStage::Append, .. }));
    assert!(storage.is_poisoned());
}

#[test]
fn test_failed_append_refuses_later_appends() {
    let (_temp, log_path) = setup_temp_log();
    let space = Arc::new(AtomicUsize::new(usize::MAX));
    let file = LimitedFile::open(&log_path, Arc::clone(&space));
    let mut storage = LogStorage::with_file(&log_path, file, FlushStrategy::SyncData).unwrap();

    storage.append(b"a", b"1").unwrap();
    let good_len = storage.len();

    // Only part of the next frame fits.
    space.store(20, Ordering::SeqCst);
    let err = storage.append(b"big", &[7u8; 10_000]).unwrap_err();
    assert!(matches!(err, KvError::LogWrite { stage: WriteStage::Append, .. }));
    assert!(storage.is_poisoned());
    assert_eq!(fs::metadata(&log_path).unwrap().len(), good_len + 20);

    // Space is back, but nothing may land after the torn bytes.
    space.store(usize::MAX, Ordering::SeqCst);
    let err = storage.append(b"after", b"space freed").unwrap_err();
    assert!(matches!(err, KvError::LogWrite { stage: WriteStage::Append, .. }));
    assert_eq!(fs::metadata(&log_path).unwrap().len(), good_len + 20);
    assert_eq!(storage.len(), good_len);
}

#[test]
fn test_reopen_after_failed_append_recovers_and_writes() {
    let (_temp, log_path) = setup_temp_log();
    let space = Arc::new(AtomicUsize::new(usize::MAX));
    {
        let file = LimitedFile::open(&log_path, Arc::clone(&space));
        let mut storage =
            LogStorage::with_file(&log_path, file, FlushStrategy::SyncData).unwrap();
        storage.append(b"a", b"1").unwrap();
        space.store(5, Ordering::SeqCst);
        storage.append(b"big", b"value").unwrap_err();
    }

    let mut storage = LogStorage::open(&log_path, FlushStrategy::SyncData).unwrap();
    let index = ShardedIndex::new(4);
    let report = Recovery::recover(&mut storage, &index).unwrap();
    assert!(report.truncated);
    assert_eq!(report.bytes_discarded, 5);
    assert!(!storage.is_poisoned());

    storage.append(b"after", b"restart").unwrap();
    storage.flush().unwrap();

    let entries: Vec<_> = storage
        .open_for_read()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(entries, vec![LogEntry::new("a", "1"), LogEntry::new("after", "restart")]);
}
