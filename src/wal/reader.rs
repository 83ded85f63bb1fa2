//! Log Reader
//!
//! Sequential scan over log entries, starting at offset 0.

use std::io::{ErrorKind, Read};
use std::iter::FusedIterator;

use bytes::Bytes;

use crate::error::{KvError, Result};

use super::entry::{decode_header, frame_len, HEADER_SIZE};
use super::LogEntry;

/// Result of reading one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete, well-framed entry
    Entry(LogEntry),

    /// Clean end of file exactly on an entry boundary
    End,

    /// Some bytes of an entry exist but not all of them
    Torn {
        /// Bytes of the incomplete entry that were actually present
        bytes_present: u64,
    },
}

/// Reads entries from any byte source
pub struct LogReader<R> {
    inner: R,
    /// Offset just past the last complete entry
    offset: u64,
    /// Iteration has stopped (end, torn entry or error)
    done: bool,
}

impl<R: Read> LogReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            offset: 0,
            done: false,
        }
    }

    /// Read the next entry
    ///
    /// Short reads are reported as `Torn`, never as an error. Only genuine I/O
    /// failures return `KvError::LogRead`.
    pub fn next_entry(&mut self) -> Result<ReadOutcome> {
        let mut header = [0u8; HEADER_SIZE];
        let got = self.fill(&mut header)?;
        if got == 0 {
            return Ok(ReadOutcome::End);
        }
        if got < HEADER_SIZE {
            return Ok(ReadOutcome::Torn {
                bytes_present: got as u64,
            });
        }

        let (key_len, value_len) = decode_header(&header);

        let key = self.read_exact_or_short(key_len)?;
        if key.len() as u64 != key_len {
            return Ok(ReadOutcome::Torn {
                bytes_present: (HEADER_SIZE + key.len()) as u64,
            });
        }

        let value = self.read_exact_or_short(value_len)?;
        if value.len() as u64 != value_len {
            return Ok(ReadOutcome::Torn {
                bytes_present: (HEADER_SIZE + key.len() + value.len()) as u64,
            });
        }

        self.offset += frame_len(key_len, value_len);
        Ok(ReadOutcome::Entry(LogEntry {
            key: Bytes::from(key),
            value: Bytes::from(value),
        }))
    }

    /// Offset just past the last complete entry returned
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Fill `buf` as far as the source allows; returns the byte count
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(KvError::LogRead(e)),
            }
        }
        Ok(filled)
    }

    /// Read up to `len` bytes. A garbage length from a torn header only
    /// allocates as much as the source actually holds.
    fn read_exact_or_short(&mut self, len: u64) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        (&mut self.inner)
            .take(len)
            .read_to_end(&mut buf)
            .map_err(KvError::LogRead)?;
        Ok(buf)
    }
}

impl<R: Read> Iterator for LogReader<R> {
    type Item = Result<LogEntry>;

    /// Yields complete entries; stops for good at end of file, at a torn
    /// entry, or after the first error
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.next_entry() {
            Ok(ReadOutcome::Entry(entry)) => Some(Ok(entry)),
            Ok(ReadOutcome::End) | Ok(ReadOutcome::Torn { .. }) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> FusedIterator for LogReader<R> {}
