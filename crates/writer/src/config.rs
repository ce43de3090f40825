//! Writer configuration
//!
//! Values are resolved once at startup and never change afterwards. Only the
//! path, delay and the two handle toggles come from the environment; chunk
//! size and report cadence are fixed constants that tests may shrink.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Bytes written per iteration (10 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// Cumulative bytes between progress reports (100 MiB)
pub const DEFAULT_REPORT_EVERY: u64 = 100 * 1024 * 1024;

/// Divisor used to express byte counts in reports
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// How file handles are acquired and released across iterations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlePolicy {
    /// One handle opened at startup, rewound before every write, never closed
    Reuse,
    /// Fresh truncating open every iteration, closed right after the write
    CloseAfterWrite,
    /// Fresh truncating open every iteration, never closed
    Leak,
}

impl HandlePolicy {
    /// Resolve the policy from the two toggles. `keep_open` is ignored when
    /// `reuse_handle` is set.
    pub fn from_flags(reuse_handle: bool, keep_open: bool) -> Self {
        match (reuse_handle, keep_open) {
            (true, _) => Self::Reuse,
            (false, false) => Self::CloseAfterWrite,
            (false, true) => Self::Leak,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reuse => "reuse",
            Self::CloseAfterWrite => "close",
            Self::Leak => "leak",
        }
    }
}

impl fmt::Display for HandlePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the write loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// File that receives every write
    pub path: PathBuf,

    /// Pause after every iteration, successful or not
    pub delay: Duration,

    /// Open one handle at startup and reuse it
    pub reuse_handle: bool,

    /// Never close freshly opened handles (ignored with `reuse_handle`)
    pub keep_open: bool,

    /// Bytes written per iteration (default: 10 MiB)
    pub chunk_size: usize,

    /// Bytes between progress reports (default: 100 MiB)
    pub report_every: u64,

    /// Unit for report figures (default: 1 MiB)
    pub report_unit: u64,
}

impl WriterConfig {
    /// Create a config with the default chunk size and report cadence,
    /// both toggles off
    pub fn new(path: impl Into<PathBuf>, delay: Duration) -> Self {
        Self {
            path: path.into(),
            delay,
            reuse_handle: false,
            keep_open: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            report_every: DEFAULT_REPORT_EVERY,
            report_unit: BYTES_PER_MB,
        }
    }

    #[must_use]
    pub fn with_reuse_handle(mut self, reuse_handle: bool) -> Self {
        self.reuse_handle = reuse_handle;
        self
    }

    #[must_use]
    pub fn with_keep_open(mut self, keep_open: bool) -> Self {
        self.keep_open = keep_open;
        self
    }

    /// Override the chunk size
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Override the report threshold
    #[must_use]
    pub fn with_report_every(mut self, report_every: u64) -> Self {
        self.report_every = report_every;
        self
    }

    /// Override the unit report figures are expressed in
    #[must_use]
    pub fn with_report_unit(mut self, report_unit: u64) -> Self {
        self.report_unit = report_unit;
        self
    }

    /// Handle policy implied by the two toggles
    pub fn policy(&self) -> HandlePolicy {
        HandlePolicy::from_flags(self.reuse_handle, self.keep_open)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check the config can drive a loop
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingPath` if the path is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingPath);
        }
        Ok(())
    }
}

/// Startup announcement
impl fmt::Display for WriterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FILE_PATH={}, DELAY={}ms, REUSE_HANDLE={}, KEEP_OPEN={}",
            self.path.display(),
            self.delay.as_millis(),
            self.reuse_handle,
            self.keep_open,
        )
    }
}

/// Parse a boolean toggle. Only the literal `"true"` enables it; anything
/// else, including `"TRUE"` and `"1"`, leaves it off.
pub fn parse_toggle(value: &str) -> bool {
    value == "true"
}

/// Parse a delay given in integer milliseconds
///
/// Negative values are accepted and mean "no pause".
///
/// # Errors
///
/// Returns `ConfigError::InvalidDelay` if the value is not an integer.
pub fn parse_delay(value: &str) -> Result<Duration, ConfigError> {
    let millis: i64 = value.parse().map_err(|e| ConfigError::InvalidDelay {
        value: value.to_string(),
        source: e,
    })?;
    Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
