//! Log entry framing
//!
//! Defines the on-disk layout of a single log entry.

use bytes::{BufMut, Bytes, BytesMut};

/// Header size: KeyLen (8) + ValLen (8)
pub const HEADER_SIZE: usize = 16;

/// A single key/value record in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub key: Bytes,
    pub value: Bytes,
}

impl LogEntry {
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Total bytes this entry occupies on disk
    pub fn encoded_len(&self) -> u64 {
        frame_len(self.key.len() as u64, self.value.len() as u64)
    }

    /// Serialize header + key + value
    pub fn encode(&self) -> Bytes {
        encode_frame(&self.key, &self.value).freeze()
    }
}

/// Build the frame for `key`/`value` without copying them into a `LogEntry` first
pub(crate) fn encode_frame(key: &[u8], value: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + key.len() + value.len());
    buf.put_u64_le(key.len() as u64);
    buf.put_u64_le(value.len() as u64);
    buf.put_slice(key);
    buf.put_slice(value);
    buf
}

/// Split a header into (key_len, value_len)
pub(crate) fn decode_header(header: &[u8; HEADER_SIZE]) -> (u64, u64) {
    let mut key_len = [0u8; 8];
    let mut value_len = [0u8; 8];
    key_len.copy_from_slice(&header[..8]);
    value_len.copy_from_slice(&header[8..]);
    (u64::from_le_bytes(key_len), u64::from_le_bytes(value_len))
}

pub(crate) fn frame_len(key_len: u64, value_len: u64) -> u64 {
    (HEADER_SIZE as u64)
        .saturating_add(key_len)
        .saturating_add(value_len)
}
