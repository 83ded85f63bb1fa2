//! Response definitions
//!
//! Represents responses to clients.

use bytes::Bytes;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    NotFound = 0x01,
    Error = 0x02,
    /// One element of a streamed reply
    Item = 0x03,
    /// No more elements follow
    StreamEnd = 0x04,
}

impl Status {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Status::Ok),
            0x01 => Some(Status::NotFound),
            0x02 => Some(Status::Error),
            0x03 => Some(Status::Item),
            0x04 => Some(Status::StreamEnd),
            _ => None,
        }
    }
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (value for GET/ITEM, error message for ERROR)
    pub payload: Option<Bytes>,
}

impl Response {
    /// Create an OK response with optional payload
    pub fn ok(payload: Option<Bytes>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// Create a NOT_FOUND response
    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            payload: None,
        }
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Some(Bytes::copy_from_slice(message.as_bytes())),
        }
    }

    /// One streamed value
    pub fn item(value: Bytes) -> Self {
        Self {
            status: Status::Item,
            payload: Some(value),
        }
    }

    pub fn stream_end() -> Self {
        Self {
            status: Status::StreamEnd,
            payload: None,
        }
    }

    /// `OK value` for a present key, `NOT_FOUND` otherwise
    pub fn lookup(value: Option<Bytes>) -> Self {
        match value {
            Some(value) => Self::ok(Some(value)),
            None => Self::not_found(),
        }
    }

    /// Payload interpreted as an error message
    pub fn message(&self) -> String {
        self.payload
            .as_ref()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .unwrap_or_default()
    }
}
