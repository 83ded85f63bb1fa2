//! Engine Module
//!
//! The key-value service that coordinates the log and the index.
//!
//! ## Responsibilities
//! - Replay the log into the index before serving anything
//! - Serialize writes: append, flush, index update under one gate
//! - Serve reads straight from the index

use std::fs;
use std::path::Path;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::Result;
use crate::index::ShardedIndex;
use crate::protocol::{Command, Response};
use crate::wal::{LogStorage, Recovery, RecoveryReport};

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (`set`): serialized by the `log` mutex, which is the write
///   gate. The guard is held across append → flush → index update, so log
///   order, index order and acknowledgement order are the same total order,
///   and the index never runs ahead of the log.
///
/// - **Reads** (`get`, `get_prefix`, `get_values`): never touch the gate.
///   They take a shard read lock in the index and observe a key either before
///   or after an in-flight write, never in between.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Append-only log; the mutex doubles as the write gate
    log: Mutex<LogStorage>,

    /// Derived cache of the log
    index: ShardedIndex,

    /// What startup recovery found
    recovery: RecoveryReport,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the log's parent directory
    /// 2. Open the log file
    /// 3. Replay it into a fresh index, truncating a torn tail
    /// 4. Ready to serve requests
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        if let Some(parent) = config.log_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let log = LogStorage::open(&config.log_path, config.flush_strategy)?;
        Self::with_log(config, log)
    }

    /// Build an engine on an already-open log
    ///
    /// `log` should be the file at `config.log_path`. It is replayed and, if
    /// needed, truncated before the engine is returned.
    pub fn with_log(config: Config, mut log: LogStorage) -> Result<Self> {
        config.validate()?;

        let index = ShardedIndex::new(config.index_shards);
        let recovery = Recovery::recover(&mut log, &index)?;

        if recovery.truncated {
            tracing::warn!(
                "Discarded {} bytes of torn log tail",
                recovery.bytes_discarded
            );
        }

        Ok(Self {
            config,
            log: Mutex::new(log),
            index,
            recovery,
        })
    }

    /// Open with a log path (convenience method)
    ///
    /// Uses default config with the specified log file
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config {
            log_path: path.to_path_buf(),
            ..Config::default()
        };
        Self::open(config)
    }

    /// Execute a single-shot command
    ///
    /// Stream commands (`GetPrefix`, `GetValues`, `Key`, `End`) are driven by
    /// the connection handler and rejected here.
    pub fn execute(&self, command: Command) -> Response {
        match command {
            Command::Get { key } => Response::lookup(self.get(&key)),
            Command::Set { key, value } => match self.set(key, value) {
                Ok(()) => Response::ok(None),
                Err(e) => Response::error(&e.to_string()),
            },
            Command::Ping => Response::ok(Some(Bytes::from_static(b"PONG"))),
            other => Response::error(&format!(
                "{:?} is not a single-shot command",
                other.command_type()
            )),
        }
    }

    /// Get the current value of `key`; `None` if it was never set
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.index.get(key)
    }

    /// Durably set a key-value pair
    ///
    /// Steps:
    /// 1. Acquire the write gate
    /// 2. Append to the log
    /// 3. Flush the log
    /// 4. Update the index
    ///
    /// If step 2 or 3 fails the index is left untouched and the error is
    /// returned. After a failed flush the entry may still be replayed at the
    /// next startup: the log, not the acknowledgement, is the source of truth.
    /// After a failed append the log refuses every later `set` until restart.
    pub fn set(&self, key: impl Into<Bytes>, value: impl Into<Bytes>) -> Result<()> {
        let key = key.into();
        let value = value.into();

        let mut log = self.log.lock();
        log.append(&key, &value)?;
        log.flush()?;
        self.index.put(key, value);

        Ok(())
    }

    /// Values of every key starting with `prefix`, unordered
    ///
    /// Writes racing with the scan may or may not be reflected.
    pub fn get_prefix(&self, prefix: &[u8]) -> Vec<Bytes> {
        self.index.prefix_scan(prefix)
    }

    /// Look up each key in order, lazily
    pub fn get_values<'a, I>(&'a self, keys: I) -> impl Iterator<Item = Option<Bytes>> + 'a
    where
        I: IntoIterator + 'a,
        I::IntoIter: 'a,
        I::Item: AsRef<[u8]>,
    {
        keys.into_iter().map(move |key| self.get(key.as_ref()))
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Logical log length in bytes
    pub fn log_len(&self) -> u64 {
        self.log.lock().len()
    }

    /// Get the log file path
    pub fn log_path(&self) -> &Path {
        &self.config.log_path
    }

    /// What recovery found when this engine was opened
    pub fn recovery_report(&self) -> &RecoveryReport {
        &self.recovery
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
