//! Write targets and the handle policy
//!
//! `TargetOpener` is the seam between the loop and the filesystem;
//! `Handles` applies the configured `HandlePolicy` on top of it and hands out
//! one `Lease` per iteration.
//!
//! # Lifecycle
//!
//! ```text
//! Reuse:           open_persistent (startup) -> [seek 0 -> write]*
//! CloseAfterWrite: [open_truncating -> write -> close]*
//! Leak:            [open_truncating -> write -> forget]*
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::HandlePolicy;
use crate::error::IterationError;

/// Anything the loop can rewind and write into
pub trait WriteTarget: Write + Seek + Send {}

impl<T: Write + Seek + Send> WriteTarget for T {}

/// Opens write targets for a path
pub trait TargetOpener: Send {
    /// Open for writing, creating if absent, keeping existing contents
    fn open_persistent(&self, path: &Path) -> io::Result<Box<dyn WriteTarget>>;

    /// Open for writing, creating if absent, truncating to zero length
    fn open_truncating(&self, path: &Path) -> io::Result<Box<dyn WriteTarget>>;
}

/// Filesystem opener (write-only, mode 0644 on Unix)
#[derive(Debug, Clone, Copy, Default)]
pub struct FsOpener;

impl FsOpener {
    fn options(truncate: bool) -> OpenOptions {
        let mut options = File::options();
        options.write(true).create(true).truncate(truncate);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }
        options
    }
}

impl TargetOpener for FsOpener {
    fn open_persistent(&self, path: &Path) -> io::Result<Box<dyn WriteTarget>> {
        Ok(Box::new(Self::options(false).open(path)?))
    }

    fn open_truncating(&self, path: &Path) -> io::Result<Box<dyn WriteTarget>> {
        Ok(Box::new(Self::options(true).open(path)?))
    }
}

/// The target for a single iteration
///
/// Releasing a lease applies the policy: a reused handle stays with
/// `Handles`, a fresh one is closed, a leaked one is forgotten so its
/// descriptor stays open until the process exits.
pub enum Lease<'a> {
    Reused(&'a mut dyn WriteTarget),
    Fresh(Box<dyn WriteTarget>),
    Leaked(Box<dyn WriteTarget>),
}

impl Lease<'_> {
    pub fn target(&mut self) -> &mut dyn WriteTarget {
        match self {
            Self::Reused(target) => &mut **target,
            Self::Fresh(target) | Self::Leaked(target) => &mut **target,
        }
    }

    /// Give the handle back according to the policy
    pub fn release(self) {
        match self {
            Self::Reused(_) => {}
            Self::Fresh(target) => drop(target),
            Self::Leaked(target) => std::mem::forget(target),
        }
    }
}

enum Slot {
    Held(Box<dyn WriteTarget>),
    Fresh,
    Leak { leaked: u64 },
}

/// Handle state owned by the loop
pub struct Handles {
    opener: Box<dyn TargetOpener>,
    path: PathBuf,
    slot: Slot,
}

impl Handles {
    /// Set up handles for `policy`
    ///
    /// In `Reuse` mode this opens the persistent handle; the error is fatal
    /// for the caller.
    pub fn open(
        policy: HandlePolicy,
        opener: Box<dyn TargetOpener>,
        path: impl Into<PathBuf>,
    ) -> io::Result<Self> {
        let path = path.into();
        let slot = match policy {
            HandlePolicy::Reuse => Slot::Held(opener.open_persistent(&path)?),
            HandlePolicy::CloseAfterWrite => Slot::Fresh,
            HandlePolicy::Leak => Slot::Leak { leaked: 0 },
        };
        Ok(Self { opener, path, slot })
    }

    pub fn policy(&self) -> HandlePolicy {
        match self.slot {
            Slot::Held(_) => HandlePolicy::Reuse,
            Slot::Fresh => HandlePolicy::CloseAfterWrite,
            Slot::Leak { .. } => HandlePolicy::Leak,
        }
    }

    /// Handles currently held open by this process on the target
    pub fn open_handles(&self) -> u64 {
        match self.slot {
            Slot::Held(_) => 1,
            Slot::Fresh => 0,
            Slot::Leak { leaked } => leaked,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a target positioned at offset 0 for this iteration
    ///
    /// A leaked handle is counted as soon as it is opened, whether or not
    /// the write that follows succeeds.
    ///
    /// # Errors
    ///
    /// `IterationError::Seek` if the held handle cannot be rewound,
    /// `IterationError::Open` if a fresh handle cannot be opened.
    pub fn acquire(&mut self) -> Result<Lease<'_>, IterationError> {
        match &mut self.slot {
            Slot::Held(target) => {
                target
                    .seek(SeekFrom::Start(0))
                    .map_err(IterationError::Seek)?;
                Ok(Lease::Reused(&mut **target))
            }
            Slot::Fresh => {
                let target = self
                    .opener
                    .open_truncating(&self.path)
                    .map_err(IterationError::Open)?;
                Ok(Lease::Fresh(target))
            }
            Slot::Leak { leaked } => {
                let target = self
                    .opener
                    .open_truncating(&self.path)
                    .map_err(IterationError::Open)?;
                *leaked += 1;
                tracing::trace!(path = %self.path.display(), leaked = *leaked, "leaking handle");
                Ok(Lease::Leaked(target))
            }
        }
    }
}

#[cfg(test)]
#[path = "target_test.rs"]
mod target_test;
