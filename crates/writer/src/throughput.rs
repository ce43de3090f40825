//! Throughput accounting
//!
//! Tracks cumulative bytes written and decides when a progress report is
//! due. The watermark only moves when a report fires, so the unreported
//! remainder is always below the threshold afterwards.

use std::fmt;
use std::time::{Duration, Instant};

/// A progress report, emitted every `report_every` bytes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    /// Cumulative bytes written
    pub total_bytes: u64,

    /// Cumulative bytes in report units (integer division)
    pub total_units: u64,

    /// Handles held open at the time of the report
    pub open_handles: u64,

    /// Bytes written since the previous report
    pub interval_bytes: u64,

    /// Wall time since the previous report (or since start)
    pub interval: Duration,

    /// Bytes per report unit
    pub unit: u64,
}

impl ProgressReport {
    /// Units per second over the report interval
    pub fn rate_per_sec(&self) -> f64 {
        let secs = self.interval.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        (self.interval_bytes as f64 / self.unit as f64) / secs
    }
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total written: {} MB, Open handles: {}",
            self.total_units, self.open_handles
        )
    }
}

/// Running byte counters
#[derive(Debug)]
pub struct Throughput {
    total_written: u64,
    last_reported_at: u64,
    report_every: u64,
    report_unit: u64,
    last_report: Instant,
}

impl Throughput {
    /// Create counters that report every `report_every` bytes, expressing
    /// totals in multiples of `report_unit` bytes
    pub fn new(report_every: u64, report_unit: u64) -> Self {
        Self {
            total_written: 0,
            last_reported_at: 0,
            report_every,
            report_unit: report_unit.max(1),
            last_report: Instant::now(),
        }
    }

    /// Account for a successful write
    ///
    /// Returns a report when the bytes since the last report reach the
    /// threshold, and moves the watermark to the current total.
    pub fn record(&mut self, bytes: u64, open_handles: u64) -> Option<ProgressReport> {
        self.total_written = self.total_written.saturating_add(bytes);

        let pending = self.total_written - self.last_reported_at;
        if pending < self.report_every {
            return None;
        }

        let now = Instant::now();
        let interval = now.duration_since(self.last_report);
        self.last_reported_at = self.total_written;
        self.last_report = now;

        Some(ProgressReport {
            total_bytes: self.total_written,
            total_units: self.total_written / self.report_unit,
            open_handles,
            interval_bytes: pending,
            interval,
            unit: self.report_unit,
        })
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Total at the time of the last report
    pub fn last_reported_at(&self) -> u64 {
        self.last_reported_at
    }

    /// Bytes written since the last report
    pub fn unreported(&self) -> u64 {
        self.total_written - self.last_reported_at
    }
}
