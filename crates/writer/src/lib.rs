//! Diskload - Writer
//!
//! Sequential write loop that repeatedly overwrites a target file with a
//! fixed-size chunk of random bytes, pacing itself with a fixed delay and
//! reporting cumulative throughput.
//!
//! # Architecture
//!
//! ```text
//! [ByteSource] --fill--> [buffer] --write_all--> [Lease] --release--> [Handles]
//!                                                                        |
//!                                             [Throughput] <--bytes------+
//! ```
//!
//! # Handle Policies
//!
//! | reuse_handle | keep_open | Policy | Open handles |
//! |--------------|-----------|--------|--------------|
//! | `true` | ignored | `Reuse` | 1 |
//! | `false` | `false` | `CloseAfterWrite` | 0 |
//! | `false` | `true` | `Leak` | grows by one per iteration |
//!
//! # Example
//!
//! ```ignore
//! use diskload_writer::{WriteLoop, WriterConfig};
//! use std::time::Duration;
//!
//! let config = WriterConfig::new("/mnt/test/load.bin", Duration::from_millis(100));
//! let mut writer = WriteLoop::new(config)?;
//!
//! // Never returns; the process is stopped externally
//! writer.run();
//! ```

/// Configuration model and environment value parsing
pub mod config;

/// Error types (fatal startup errors and recoverable iteration errors)
pub mod error;

/// Random buffer refill
pub mod source;

/// File-handle acquisition policy
pub mod target;

/// Cumulative byte accounting and progress reports
pub mod throughput;

/// The write loop driver
pub mod write_loop;

#[cfg(test)]
mod test_support;

pub use config::{
    BYTES_PER_MB, DEFAULT_CHUNK_SIZE, DEFAULT_REPORT_EVERY, HandlePolicy, WriterConfig,
    parse_delay, parse_toggle,
};
pub use error::{ConfigError, IterationError, Stage, WriterError};
pub use source::{ByteSource, OsRandom};
pub use target::{FsOpener, Handles, Lease, TargetOpener, WriteTarget};
pub use throughput::{ProgressReport, Throughput};
pub use write_loop::{Step, WriteLoop};
