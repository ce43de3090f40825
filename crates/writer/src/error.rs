//! Writer error types
//!
//! Two tiers: `ConfigError`/`WriterError` are fatal and only occur before the
//! loop starts; `IterationError` is recoverable and only occurs inside it.

use std::fmt;
use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for startup operations
pub type Result<T> = std::result::Result<T, WriterError>;

/// Errors in the resolved configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Target path is absent or empty
    #[error("target path is required (set FILE_PATH)")]
    MissingPath,

    /// Delay is not an integer number of milliseconds
    #[error("invalid delay '{value}': {source}")]
    InvalidDelay {
        /// Raw value as given
        value: String,
        /// Underlying parse error
        #[source]
        source: ParseIntError,
    },
}

/// Fatal errors raised while constructing the write loop
#[derive(Debug, Error)]
pub enum WriterError {
    /// Configuration rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Persistent handle could not be opened in reuse mode
    #[error("failed to open '{path}': {source}")]
    Open {
        /// Target path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },
}

/// Step of an iteration that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Refilling the buffer with random bytes
    Fill,
    /// Rewinding the reused handle
    Seek,
    /// Opening a fresh handle
    Open,
    /// Writing the buffer
    Write,
}

impl Stage {
    /// Short name used as a log field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fill => "fill",
            Self::Seek => "seek",
            Self::Open => "open",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recoverable failure of a single iteration
///
/// Every variant is handled the same way: log, pause, retry from the top.
#[derive(Debug, Error)]
pub enum IterationError {
    #[error("error generating random data: {0}")]
    Fill(#[source] io::Error),

    #[error("error seeking file: {0}")]
    Seek(#[source] io::Error),

    #[error("error opening file: {0}")]
    Open(#[source] io::Error),

    #[error("error writing to file: {0}")]
    Write(#[source] io::Error),
}

impl IterationError {
    /// Which step of the iteration failed
    pub fn stage(&self) -> Stage {
        match self {
            Self::Fill(_) => Stage::Fill,
            Self::Seek(_) => Stage::Seek,
            Self::Open(_) => Stage::Open,
            Self::Write(_) => Stage::Write,
        }
    }

    /// Underlying IO error
    pub fn io_error(&self) -> &io::Error {
        match self {
            Self::Fill(e) | Self::Seek(e) | Self::Open(e) | Self::Write(e) => e,
        }
    }
}
