//! Error types for DuraKV
//!
//! Provides a unified error type for all operations.

use std::fmt;

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Which step of the write path failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    /// Writing the entry bytes to the log
    Append,
    /// Forcing written bytes to stable storage
    Flush,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteStage::Append => f.write_str("append"),
            WriteStage::Flush => f.write_str("flush"),
        }
    }
}

/// Unified error type for DuraKV operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Log Errors
    // -------------------------------------------------------------------------
    /// A `Set` could not be made durable. The index was not touched.
    #[error("log {stage} failed: {source}")]
    LogWrite {
        stage: WriteStage,
        #[source]
        source: std::io::Error,
    },

    /// Only raised while scanning the log; recovery turns it into a truncation.
    #[error("log read failed: {0}")]
    LogRead(#[source] std::io::Error),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Error status reported by the server
    #[error("Server error: {0}")]
    Remote(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KvError {
    pub(crate) fn append(source: std::io::Error) -> Self {
        KvError::LogWrite {
            stage: WriteStage::Append,
            source,
        }
    }

    pub(crate) fn flush(source: std::io::Error) -> Self {
        KvError::LogWrite {
            stage: WriteStage::Flush,
            source,
        }
    }

    /// True for failures of the durable write path (append or flush)
    pub fn is_write_error(&self) -> bool {
        matches!(self, KvError::LogWrite { .. })
    }
}
