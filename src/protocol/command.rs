//! Command definitions
//!
//! Represents requests from clients.

use bytes::Bytes;

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Get = 0x01,
    Set = 0x02,
    GetPrefix = 0x03,
    GetValues = 0x04,
    Key = 0x05,
    End = 0x06,
    Ping = 0x07,
}

impl CommandType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(CommandType::Get),
            0x02 => Some(CommandType::Set),
            0x03 => Some(CommandType::GetPrefix),
            0x04 => Some(CommandType::GetValues),
            0x05 => Some(CommandType::Key),
            0x06 => Some(CommandType::End),
            0x07 => Some(CommandType::Ping),
            _ => None,
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Get a value by key
    Get { key: Bytes },

    /// Durably set a key-value pair
    Set { key: Bytes, value: Bytes },

    /// Stream the values of every key with this prefix
    GetPrefix { prefix: Bytes },

    /// Open a duplex lookup stream: `Key` frames follow, closed by `End`
    GetValues,

    /// One lookup inside a `GetValues` stream
    Key { key: Bytes },

    /// Client is done sending on the current stream
    End,

    /// Ping (health check)
    Ping,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Get { .. } => CommandType::Get,
            Command::Set { .. } => CommandType::Set,
            Command::GetPrefix { .. } => CommandType::GetPrefix,
            Command::GetValues => CommandType::GetValues,
            Command::Key { .. } => CommandType::Key,
            Command::End => CommandType::End,
            Command::Ping => CommandType::Ping,
        }
    }
}
