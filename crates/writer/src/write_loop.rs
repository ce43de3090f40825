//! Write loop
//!
//! Drives the fill → acquire → write → release → account → pause cycle.
//! Every failure inside an iteration is logged and retried from the top
//! after the configured delay; there is no retry ceiling and no backoff.
//!
//! # Example
//!
//! ```ignore
//! let config = WriterConfig::new("load.bin", Duration::ZERO)
//!     .with_chunk_size(1024)
//!     .with_report_every(4096);
//! let mut writer = WriteLoop::new(config)?;
//!
//! let step = writer.step()?;
//! assert_eq!(step.written, 1024);
//! ```

use std::io::Write;
use std::time::Duration;

use crate::config::{HandlePolicy, WriterConfig};
use crate::error::{IterationError, Result, WriterError};
use crate::source::{ByteSource, OsRandom};
use crate::target::{FsOpener, Handles, TargetOpener};
use crate::throughput::{ProgressReport, Throughput};

/// Outcome of a successful iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Bytes written by this iteration
    pub written: u64,

    /// Report emitted by this iteration, if the threshold was reached
    pub report: Option<ProgressReport>,
}

/// Sequential disk-write loop
///
/// Owns the buffer, the handle state and the counters. Nothing is shared,
/// so there is no locking; iteration N+1 never starts before N (including
/// its close) has finished.
pub struct WriteLoop {
    config: WriterConfig,
    buffer: Vec<u8>,
    source: Box<dyn ByteSource>,
    handles: Handles,
    throughput: Throughput,
}

impl WriteLoop {
    /// Create a loop writing OS-random bytes to the filesystem
    ///
    /// # Errors
    ///
    /// Fails if the config is invalid or, in reuse mode, the target cannot
    /// be opened.
    pub fn new(config: WriterConfig) -> Result<Self> {
        Self::with_parts(config, Box::new(FsOpener), Box::new(OsRandom))
    }

    /// Create a loop with a custom opener and byte source
    ///
    /// # Errors
    ///
    /// Same as [`WriteLoop::new`].
    pub fn with_parts(
        config: WriterConfig,
        opener: Box<dyn TargetOpener>,
        source: Box<dyn ByteSource>,
    ) -> Result<Self> {
        config.validate()?;

        let handles = Handles::open(config.policy(), opener, &config.path).map_err(|e| {
            WriterError::Open {
                path: config.path.clone(),
                source: e,
            }
        })?;

        Ok(Self {
            buffer: vec![0u8; config.chunk_size],
            throughput: Throughput::new(config.report_every, config.report_unit),
            source,
            handles,
            config,
        })
    }

    /// Run one iteration without pausing
    ///
    /// # Errors
    ///
    /// Returns the failing stage; counters are left untouched. A fresh
    /// (non-leaked) handle opened by this iteration is closed before
    /// returning.
    pub fn step(&mut self) -> std::result::Result<Step, IterationError> {
        self.source
            .fill(&mut self.buffer)
            .map_err(IterationError::Fill)?;

        let mut lease = self.handles.acquire()?;
        let written = lease.target().write_all(&self.buffer);
        lease.release();
        written.map_err(IterationError::Write)?;

        let written = self.buffer.len() as u64;
        let report = self
            .throughput
            .record(written, self.handles.open_handles());

        Ok(Step { written, report })
    }

    /// Run one iteration, log its outcome and pause for the delay
    pub fn tick(&mut self) -> std::result::Result<Step, IterationError> {
        let outcome = self.step();
        match &outcome {
            Ok(Step {
                report: Some(report),
                ..
            }) => {
                tracing::info!(
                    total_mb = report.total_units,
                    open_handles = report.open_handles,
                    rate_mb_s = report.rate_per_sec(),
                    "{report}"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(
                    stage = %e.stage(),
                    path = %self.config.path.display(),
                    error = %e.io_error(),
                    "{e}"
                );
            }
        }
        self.pause();
        outcome
    }

    /// Loop forever; the process is expected to be stopped externally
    pub fn run(&mut self) -> ! {
        tracing::info!(
            policy = %self.policy(),
            chunk_size = self.config.chunk_size,
            report_every = self.config.report_every,
            "starting writer: {}",
            self.config
        );
        loop {
            let _ = self.tick();
        }
    }

    fn pause(&self) {
        if !self.config.delay.is_zero() {
            std::thread::sleep(self.config.delay);
        }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    pub fn policy(&self) -> HandlePolicy {
        self.handles.policy()
    }

    pub fn delay(&self) -> Duration {
        self.config.delay
    }

    /// Cumulative bytes written
    pub fn total_written(&self) -> u64 {
        self.throughput.total_written()
    }

    /// Total at the time of the last progress report
    pub fn last_reported_at(&self) -> u64 {
        self.throughput.last_reported_at()
    }

    /// Handles currently held open on the target
    pub fn open_handles(&self) -> u64 {
        self.handles.open_handles()
    }

    /// Current buffer contents (the bytes of the last write or attempt)
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }
}

#[cfg(test)]
#[path = "write_loop_test.rs"]
mod write_loop_test;
