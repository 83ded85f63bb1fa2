//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Payload by Command Type
//! - GET, GET_PREFIX, KEY: raw key or prefix bytes
//! - SET:                  key_len (4) + key + value
//! - GET_VALUES, END, PING: empty

use std::io::{Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{KvError, Result};
use super::{Command, CommandType, Response, Status};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Bytes {
    let mut payload = BytesMut::new();
    match command {
        Command::Get { key } | Command::Key { key } => payload.put_slice(key),
        Command::GetPrefix { prefix } => payload.put_slice(prefix),
        Command::Set { key, value } => {
            payload.reserve(4 + key.len() + value.len());
            payload.put_u32(key.len() as u32);
            payload.put_slice(key);
            payload.put_slice(value);
        }
        Command::GetValues | Command::End | Command::Ping => {}
    }

    frame(command.command_type() as u8, &payload)
}

/// Decode a command from a complete frame
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (cmd_type, payload) = split_frame(bytes, "command")?;

    let cmd_type = CommandType::from_byte(cmd_type).ok_or_else(|| {
        KvError::Protocol(format!("Unknown command type: 0x{:02x}", cmd_type))
    })?;

    match cmd_type {
        CommandType::Get => Ok(Command::Get {
            key: Bytes::copy_from_slice(payload),
        }),
        CommandType::Key => Ok(Command::Key {
            key: Bytes::copy_from_slice(payload),
        }),
        CommandType::GetPrefix => Ok(Command::GetPrefix {
            prefix: Bytes::copy_from_slice(payload),
        }),
        CommandType::Set => decode_set_command(payload),
        CommandType::GetValues => expect_empty(payload, "GET_VALUES").map(|_| Command::GetValues),
        CommandType::End => expect_empty(payload, "END").map(|_| Command::End),
        CommandType::Ping => expect_empty(payload, "PING").map(|_| Command::Ping),
    }
}

/// Decode SET command payload
fn decode_set_command(payload: &[u8]) -> Result<Command> {
    if payload.len() < 4 {
        return Err(KvError::Protocol(
            "SET command: missing key length".to_string(),
        ));
    }

    let key_len = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]) as usize;

    if payload.len() < 4 + key_len {
        return Err(KvError::Protocol(format!(
            "SET command: incomplete key (expected {}, got {})",
            key_len,
            payload.len() - 4
        )));
    }

    let key = Bytes::copy_from_slice(&payload[4..4 + key_len]);
    let value = Bytes::copy_from_slice(&payload[4 + key_len..]);

    Ok(Command::Set { key, value })
}

fn expect_empty(payload: &[u8], name: &str) -> Result<()> {
    if !payload.is_empty() {
        return Err(KvError::Protocol(format!(
            "{} command: unexpected payload of {} bytes",
            name,
            payload.len()
        )));
    }
    Ok(())
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Bytes {
    let payload = response.payload.as_deref().unwrap_or(&[]);
    frame(response.status as u8, payload)
}

/// Decode a response from a complete frame
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes, "response")?;

    let status = Status::from_byte(status_byte).ok_or_else(|| {
        KvError::Protocol(format!("Unknown response status: 0x{:02x}", status_byte))
    })?;

    // An OK with an empty payload carries an empty value; only NOT_FOUND means absent.
    let payload = match status {
        Status::Ok | Status::Item | Status::Error => Some(Bytes::copy_from_slice(payload)),
        Status::NotFound | Status::StreamEnd => None,
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Framing helpers
// =============================================================================

fn frame(type_byte: u8, payload: &[u8]) -> Bytes {
    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(type_byte);
    message.put_u32(payload.len() as u32);
    message.put_slice(payload);
    message.freeze()
}

fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(KvError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
    check_payload_len(payload_len)?;

    let total_len = HEADER_SIZE + payload_len as usize;
    if bytes.len() < total_len {
        return Err(KvError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((bytes[0], &bytes[HEADER_SIZE..total_len]))
}

fn check_payload_len(payload_len: u32) -> Result<()> {
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(KvError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

/// Read one whole frame (header + payload) from a stream
fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
    check_payload_len(payload_len)?;

    let mut message = vec![0u8; HEADER_SIZE + payload_len as usize];
    message[..HEADER_SIZE].copy_from_slice(&header);
    reader.read_exact(&mut message[HEADER_SIZE..])?;
    Ok(message)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let message = read_frame(reader)?;
    decode_command(&message)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    writer.write_all(&encode_command(command))?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let message = read_frame(reader)?;
    decode_response(&message)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&encode_response(response))?;
    writer.flush()?;
    Ok(())
}
