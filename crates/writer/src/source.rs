//! Buffer refill
//!
//! The write buffer is refilled in place before every iteration. A failed
//! refill leaves the previous contents untouched and the iteration is
//! retried; nothing is written from a half-filled buffer.

use std::io;

use rand::TryRngCore;
use rand::rngs::OsRng;

/// Source of bytes for the write buffer
pub trait ByteSource: Send {
    /// Overwrite `buf` entirely
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<()>;
}

/// Operating-system CSPRNG
///
/// Each fill is a fresh read from the OS entropy source, so consecutive
/// chunks never repeat and cannot be deduplicated or compressed by the
/// storage layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl ByteSource for OsRandom {
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<()> {
        OsRng.try_fill_bytes(buf).map_err(io::Error::other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_random_fills_whole_buffer() {
        let mut buf = vec![0u8; 64 * 1024];
        OsRandom.fill(&mut buf).unwrap();

        // 64 KiB of zeros from a CSPRNG is not going to happen
        assert!(buf.iter().any(|&b| b != 0));
        assert_eq!(buf.len(), 64 * 1024);
    }

    #[test]
    fn test_os_random_refill_changes_contents() {
        let mut buf = vec![0u8; 4096];
        OsRandom.fill(&mut buf).unwrap();
        let first = buf.clone();

        OsRandom.fill(&mut buf).unwrap();
        assert_ne!(first, buf);
    }

    #[test]
    fn test_os_random_empty_buffer() {
        let mut buf: Vec<u8> = Vec::new();
        assert!(OsRandom.fill(&mut buf).is_ok());
    }
}
