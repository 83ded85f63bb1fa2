//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Type (1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: GET        - Payload: key
//! - 0x02: SET        - Payload: key_len (4) + key + value
//! - 0x03: GET_PREFIX - Payload: prefix
//! - 0x04: GET_VALUES - Payload: empty, opens a lookup stream
//! - 0x05: KEY        - Payload: key (only inside a lookup stream)
//! - 0x06: END        - Payload: empty, closes a lookup stream
//! - 0x07: PING       - Payload: empty
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: NOT_FOUND
//! - 0x02: ERROR
//! - 0x03: ITEM (stream element)
//! - 0x04: STREAM_END
//!
//! ### Streams
//! `GET_PREFIX` is answered by any number of `ITEM` frames and a final
//! `STREAM_END`. After `GET_VALUES` every `KEY` is answered, in order, with
//! `OK value` or `NOT_FOUND`; `END` is answered with `STREAM_END`.

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Response, Status};
pub use codec::{
    encode_command, decode_command, encode_response, decode_response,
    read_command, write_command, read_response, write_response,
    HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
