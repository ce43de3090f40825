//! Scripted openers, targets and byte sources for failure injection

use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::source::ByteSource;
use crate::target::{TargetOpener, WriteTarget};

/// Counters and pending failures shared between a test and its mocks
#[derive(Debug, Default)]
pub struct Probe {
    pub persistent_opens: AtomicU64,
    pub truncating_opens: AtomicU64,
    pub closes: AtomicU64,
    pub seeks: AtomicU64,
    pub writes: AtomicU64,
    pub bytes: AtomicU64,

    pub fail_opens: AtomicUsize,
    pub fail_seeks: AtomicUsize,
    pub fail_writes: AtomicUsize,
    pub short_writes: AtomicUsize,

    pub last_path: std::sync::Mutex<Option<PathBuf>>,
}

impl Probe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn opens(&self) -> u64 {
        self.persistent_opens.load(Ordering::Relaxed) + self.truncating_opens.load(Ordering::Relaxed)
    }

    pub fn closes(&self) -> u64 {
        self.closes.load(Ordering::Relaxed)
    }

    pub fn fail_next_opens(&self, n: usize) {
        self.fail_opens.store(n, Ordering::Relaxed);
    }

    pub fn fail_next_seeks(&self, n: usize) {
        self.fail_seeks.store(n, Ordering::Relaxed);
    }

    pub fn fail_next_writes(&self, n: usize) {
        self.fail_writes.store(n, Ordering::Relaxed);
    }

    /// Next `n` writes accept only part of the buffer, then error
    pub fn short_next_writes(&self, n: usize) {
        self.short_writes.store(n, Ordering::Relaxed);
    }
}

/// Decrement a pending-failure counter, returning true if one was pending
fn take(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
        .is_ok()
}

/// In-memory target that reports to a `Probe` and counts its own drop as a
/// close
pub struct ProbeTarget {
    probe: Arc<Probe>,
    len: u64,
    pos: u64,
}

impl Write for ProbeTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if take(&self.probe.fail_writes) {
            return Err(io::Error::new(io::ErrorKind::StorageFull, "no space left"));
        }
        if take(&self.probe.short_writes) {
            // Accept half, then fail the remainder so write_all errors out
            self.probe.fail_writes.fetch_add(1, Ordering::Relaxed);
            let n = buf.len() / 2;
            self.pos += n as u64;
            self.len = self.len.max(self.pos);
            return Ok(n);
        }
        self.probe.writes.fetch_add(1, Ordering::Relaxed);
        self.probe.bytes.fetch_add(buf.len() as u64, Ordering::Relaxed);
        self.pos += buf.len() as u64;
        self.len = self.len.max(self.pos);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for ProbeTarget {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if take(&self.probe.fail_seeks) {
            return Err(io::Error::other("seek failed"));
        }
        self.probe.seeks.fetch_add(1, Ordering::Relaxed);
        self.pos = match pos {
            SeekFrom::Start(n) => n,
            SeekFrom::End(n) => self.len.saturating_add_signed(n),
            SeekFrom::Current(n) => self.pos.saturating_add_signed(n),
        };
        Ok(self.pos)
    }
}

impl Drop for ProbeTarget {
    fn drop(&mut self) {
        self.probe.closes.fetch_add(1, Ordering::Relaxed);
    }
}

/// Opener producing `ProbeTarget`s
pub struct ProbeOpener {
    probe: Arc<Probe>,
}

impl ProbeOpener {
    pub fn new(probe: &Arc<Probe>) -> Box<Self> {
        Box::new(Self {
            probe: Arc::clone(probe),
        })
    }

    fn open(&self, path: &Path, counter: &AtomicU64) -> io::Result<Box<dyn WriteTarget>> {
        if take(&self.probe.fail_opens) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        counter.fetch_add(1, Ordering::Relaxed);
        *self.probe.last_path.lock().unwrap() = Some(path.to_path_buf());
        Ok(Box::new(ProbeTarget {
            probe: Arc::clone(&self.probe),
            len: 0,
            pos: 0,
        }))
    }
}

impl TargetOpener for ProbeOpener {
    fn open_persistent(&self, path: &Path) -> io::Result<Box<dyn WriteTarget>> {
        self.open(path, &self.probe.persistent_opens)
    }

    fn open_truncating(&self, path: &Path) -> io::Result<Box<dyn WriteTarget>> {
        self.open(path, &self.probe.truncating_opens)
    }
}

/// Deterministic byte source: fills with an incrementing byte value and can
/// be told to fail
#[derive(Debug, Default)]
pub struct ScriptedSource {
    next: u8,
    pub fail_fills: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new() -> Box<Self> {
        Box::new(Self {
            next: 1,
            fail_fills: Arc::new(AtomicUsize::new(0)),
        })
    }
}

impl ByteSource for ScriptedSource {
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<()> {
        if take(&self.fail_fills) {
            return Err(io::Error::other("entropy source unavailable"));
        }
        buf.fill(self.next);
        self.next = self.next.wrapping_add(1);
        Ok(())
    }
}
