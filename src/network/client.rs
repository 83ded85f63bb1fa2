//! Blocking client
//!
//! Speaks the wire protocol over one TCP connection.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use bytes::Bytes;

use crate::error::{KvError, Result};
use crate::protocol::{read_response, write_command, Command, Response, Status};

/// Client for a DuraKV server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| KvError::Network(format!("Failed to connect: {}", e)))?;
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        })
    }

    /// Current value of `key`, `None` when the server reports NOT_FOUND
    pub fn get(&mut self, key: impl Into<Bytes>) -> Result<Option<Bytes>> {
        let response = self.call(&Command::Get { key: key.into() })?;
        lookup_result(response)
    }

    /// Durably set a pair; returns once the server has acknowledged it
    pub fn set(&mut self, key: impl Into<Bytes>, value: impl Into<Bytes>) -> Result<()> {
        let response = self.call(&Command::Set {
            key: key.into(),
            value: value.into(),
        })?;

        match response.status {
            Status::Ok => Ok(()),
            Status::Error => Err(KvError::Remote(response.message())),
            other => Err(unexpected(other)),
        }
    }

    /// All values whose key starts with `prefix`, in server order
    pub fn get_prefix(&mut self, prefix: impl Into<Bytes>) -> Result<Vec<Bytes>> {
        write_command(&mut self.writer, &Command::GetPrefix { prefix: prefix.into() })?;

        let mut values = Vec::new();
        loop {
            let response = read_response(&mut self.reader)?;
            match response.status {
                Status::Item => values.push(response.payload.unwrap_or_default()),
                Status::StreamEnd => return Ok(values),
                Status::Error => return Err(KvError::Remote(response.message())),
                other => return Err(unexpected(other)),
            }
        }
    }

    /// Look up many keys over one duplex stream; results keep the key order
    pub fn get_values<I, K>(&mut self, keys: I) -> Result<Vec<Option<Bytes>>>
    where
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        write_command(&mut self.writer, &Command::GetValues)?;

        let mut values = Vec::new();
        for key in keys {
            write_command(&mut self.writer, &Command::Key { key: key.into() })?;
            let response = read_response(&mut self.reader)?;
            values.push(lookup_result(response)?);
        }

        write_command(&mut self.writer, &Command::End)?;
        let response = read_response(&mut self.reader)?;
        match response.status {
            Status::StreamEnd => Ok(values),
            Status::Error => Err(KvError::Remote(response.message())),
            other => Err(unexpected(other)),
        }
    }

    /// Health check
    pub fn ping(&mut self) -> Result<()> {
        let response = self.call(&Command::Ping)?;
        match response.status {
            Status::Ok => Ok(()),
            Status::Error => Err(KvError::Remote(response.message())),
            other => Err(unexpected(other)),
        }
    }

    fn call(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)
    }
}

fn lookup_result(response: Response) -> Result<Option<Bytes>> {
    match response.status {
        Status::Ok => Ok(Some(response.payload.unwrap_or_default())),
        Status::NotFound => Ok(None),
        Status::Error => Err(KvError::Remote(response.message())),
        other => Err(unexpected(other)),
    }
}

fn unexpected(status: Status) -> KvError {
    KvError::Protocol(format!("Unexpected response status: {:?}", status))
}
