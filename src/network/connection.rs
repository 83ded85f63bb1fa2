//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{KvError, Result};
use crate::protocol::{encode_response, read_command, write_response, Command, Response};

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Reference to the storage engine
    engine: Arc<Engine>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O
    pub fn new(stream: TcpStream, engine: Arc<Engine>) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            engine,
            peer_addr,
        })
    }

    /// Configure connection timeouts
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads commands in a loop and sends responses.
    /// Returns when the client disconnects or an error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        match self.serve() {
            Err(KvError::Io(e)) if is_disconnect(e.kind()) => {
                tracing::debug!("Client {} disconnected ({:?})", self.peer_addr, e.kind());
                Ok(())
            }
            Err(KvError::Protocol(msg)) => {
                tracing::warn!("Protocol error from {}: {}", self.peer_addr, msg);
                // Best effort; the peer may already be gone.
                let _ = write_response(&mut self.writer, &Response::error(&msg));
                Err(KvError::Protocol(msg))
            }
            Err(e) => {
                tracing::warn!("Connection {} failed: {}", self.peer_addr, e);
                Err(e)
            }
            Ok(()) => Ok(()),
        }
    }

    fn serve(&mut self) -> Result<()> {
        loop {
            let command = read_command(&mut self.reader)?;
            tracing::trace!("Received command from {}: {:?}", self.peer_addr, command);

            match command {
                Command::GetPrefix { prefix } => self.stream_prefix(&prefix)?,
                Command::GetValues => self.stream_values()?,
                Command::Key { .. } | Command::End => {
                    write_response(
                        &mut self.writer,
                        &Response::error("KEY/END outside of a GET_VALUES stream"),
                    )?;
                }
                other => {
                    let response = self.engine.execute(other);
                    write_response(&mut self.writer, &response)?;
                }
            }
        }
    }

    /// Answer GET_PREFIX with one ITEM per matching value, then STREAM_END
    fn stream_prefix(&mut self, prefix: &[u8]) -> Result<()> {
        // Collected before any network I/O so no shard lock is held while writing.
        let values = self.engine.get_prefix(prefix);
        tracing::trace!("Prefix scan for {} returned {} values", self.peer_addr, values.len());

        for value in values {
            self.writer.write_all(&encode_response(&Response::item(value)))?;
        }
        write_response(&mut self.writer, &Response::stream_end())
    }

    /// Duplex lookup: answer each KEY in order until END
    fn stream_values(&mut self) -> Result<()> {
        loop {
            match read_command(&mut self.reader)? {
                Command::Key { key } => {
                    let response = Response::lookup(self.engine.get(&key));
                    write_response(&mut self.writer, &response)?;
                }
                Command::End => {
                    return write_response(&mut self.writer, &Response::stream_end());
                }
                other => {
                    return Err(KvError::Protocol(format!(
                        "{:?} inside a GET_VALUES stream",
                        other.command_type()
                    )));
                }
            }
        }
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::WouldBlock
            | ErrorKind::TimedOut
    )
}
