//! Configuration for DuraKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{KvError, Result};

/// Main configuration for a DuraKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Log Configuration
    // -------------------------------------------------------------------------
    /// Path of the append-only log file. Its parent directory is created on open.
    pub log_path: PathBuf,

    /// How each append is pushed towards stable storage
    pub flush_strategy: FlushStrategy,

    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// Number of lock shards in the in-memory index (rounded up to a power of two, at least 2)
    pub index_shards: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

/// Flush strategy applied after every append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushStrategy {
    /// fdatasync after every append (survives power loss)
    SyncData,

    /// No explicit flush. `write` already hands the bytes to the OS page
    /// cache and `Write::flush` on a `File` is a no-op, so entries survive a
    /// process crash but not power loss.
    OsBuffer,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("./durakv_data/kv.log"),
            flush_strategy: FlushStrategy::SyncData,
            index_shards: 64,
            listen_addr: "0.0.0.0:50051".to_string(),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check invariants the engine relies on
    pub fn validate(&self) -> Result<()> {
        if self.log_path.as_os_str().is_empty() {
            return Err(KvError::Config("log_path must not be empty".to_string()));
        }
        if self.index_shards == 0 {
            return Err(KvError::Config("index_shards must be at least 1".to_string()));
        }
        if self.max_connections == 0 {
            return Err(KvError::Config("max_connections must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the log file path
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_path = path.into();
        self
    }

    /// Set the flush strategy
    pub fn flush_strategy(mut self, strategy: FlushStrategy) -> Self {
        self.config.flush_strategy = strategy;
        self
    }

    /// Set the number of index shards
    pub fn index_shards(mut self, shards: usize) -> Self {
        self.config.index_shards = shards;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
