//! Log Storage
//!
//! Owns the log file handle. Nothing outside this type touches the raw file.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::config::FlushStrategy;
use crate::error::{KvError, Result};

use super::entry::{encode_frame, HEADER_SIZE};
use super::LogReader;

/// Byte sink the log appends to
///
/// Implemented for `File`. Writes must land at the end of the file.
pub trait LogFile: Write + Send {
    /// Push written data to stable storage
    fn sync_data(&self) -> io::Result<()>;

    /// Push data and metadata to stable storage
    fn sync_all(&self) -> io::Result<()>;

    /// Shrink or extend the file to `len` bytes
    fn set_len(&self, len: u64) -> io::Result<()>;

    /// Current length as the filesystem reports it
    fn file_len(&self) -> io::Result<u64>;
}

impl LogFile for File {
    fn sync_data(&self) -> io::Result<()> {
        File::sync_data(self)
    }

    fn sync_all(&self) -> io::Result<()> {
        File::sync_all(self)
    }

    fn set_len(&self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }

    fn file_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}

/// Append-only log file
///
/// Not internally synchronized: callers serialize `append`/`flush` through the
/// engine's write gate.
pub struct LogStorage {
    /// Location of the log file (reopened for every sequential scan)
    path: PathBuf,
    /// Append handle
    file: Box<dyn LogFile>,
    /// Logical end of the log in bytes
    len: u64,
    flush_strategy: FlushStrategy,
    /// Set by a failed append; refuses every later append
    poisoned: bool,
}

impl LogStorage {
    /// Open or create the log file at `path`
    pub fn open(path: &Path, flush_strategy: FlushStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Self::with_file(path, file, flush_strategy)
    }

    /// Wrap an already-open append handle for the log at `path`
    ///
    /// `path` is still used to open sequential readers.
    pub fn with_file(
        path: &Path,
        file: impl LogFile + 'static,
        flush_strategy: FlushStrategy,
    ) -> Result<Self> {
        let len = file.file_len()?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Box::new(file),
            len,
            flush_strategy,
            poisoned: false,
        })
    }

    /// Append one entry and return the offset at which its value starts
    ///
    /// A failed append may leave a partial entry on disk. It is not repaired
    /// here; the next recovery truncates it. Until then every append fails,
    /// since a later entry written after the torn bytes would be cut off by
    /// that truncation.
    pub fn append(&mut self, key: &[u8], value: &[u8]) -> Result<u64> {
        if self.poisoned {
            return Err(KvError::append(io::Error::new(
                io::ErrorKind::Other,
                "log is unwritable after an earlier failed append",
            )));
        }

        let frame = encode_frame(key, value);

        if let Err(e) = self.file.write_all(&frame) {
            self.poisoned = true;
            tracing::error!(
                "Log append of {} bytes failed, refusing further appends: {}",
                frame.len(),
                e
            );
            return Err(KvError::append(e));
        }

        let value_offset = self.len + (HEADER_SIZE + key.len()) as u64;
        self.len += frame.len() as u64;
        Ok(value_offset)
    }

    /// Push appended bytes to stable storage according to the flush strategy
    pub fn flush(&mut self) -> Result<()> {
        let result = match self.flush_strategy {
            FlushStrategy::SyncData => self.file.sync_data(),
            FlushStrategy::OsBuffer => self.file.flush(),
        };

        result.map_err(|e| {
            tracing::error!("Log flush failed: {}", e);
            KvError::flush(e)
        })
    }

    /// Open a sequential reader positioned at offset 0
    pub fn open_for_read(&self) -> Result<LogReader<BufReader<File>>> {
        let file = File::open(&self.path)?;
        Ok(LogReader::new(BufReader::new(file)))
    }

    /// Cut the file back to `offset` bytes (recovery only)
    pub fn truncate(&mut self, offset: u64) -> Result<()> {
        self.file.set_len(offset)?;
        self.file.sync_all()?;
        self.len = offset;
        Ok(())
    }

    /// Logical length of the log
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Length of the file as the filesystem currently reports it
    pub fn file_len(&self) -> Result<u64> {
        Ok(self.file.file_len()?)
    }

    /// Whether an earlier append failed
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn flush_strategy(&self) -> FlushStrategy {
        self.flush_strategy
    }
}
