//! Diskload - Synthetic disk-write load generator
//!
//! Repeatedly overwrites a file with a 10 MiB chunk of random bytes, pausing
//! between writes, and reports cumulative throughput every 100 MiB. Runs
//! until the process is killed.
//!
//! # Usage
//!
//! ```bash
//! # Environment only
//! FILE_PATH=/mnt/test/load.bin DELAY=100 diskload
//!
//! # Reuse one handle for the whole run
//! FILE_PATH=/mnt/test/load.bin DELAY=0 REUSE_HANDLE=true diskload
//!
//! # Leak a handle every iteration
//! diskload --file-path /mnt/test/load.bin --delay 500 --keep-open true
//! ```

use std::convert::Infallible;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use diskload_writer::{WriteLoop, WriterConfig, parse_delay, parse_toggle};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Diskload - Synthetic disk-write load generator
#[derive(Parser, Debug)]
#[command(name = "diskload")]
#[command(version, about, long_about = None)]
struct Cli {
    /// File to write to (created if absent)
    #[arg(long, env = "FILE_PATH")]
    file_path: PathBuf,

    /// Pause between iterations in milliseconds (negative means none)
    #[arg(long, env = "DELAY", value_parser = parse_delay, allow_negative_numbers = true)]
    delay: Duration,

    /// Open the file once and rewind it before every write ("true" to enable)
    #[arg(long, env = "REUSE_HANDLE", default_value = "false", action = ArgAction::Set, value_parser = toggle)]
    reuse_handle: bool,

    /// Never close freshly opened handles ("true" to enable, ignored with --reuse-handle)
    #[arg(long, env = "KEEP_OPEN", default_value = "false", action = ArgAction::Set, value_parser = toggle)]
    keep_open: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn writer_config(&self) -> WriterConfig {
        WriterConfig::new(self.file_path.clone(), self.delay)
            .with_reuse_handle(self.reuse_handle)
            .with_keep_open(self.keep_open)
    }
}

fn toggle(value: &str) -> std::result::Result<bool, Infallible> {
    Ok(parse_toggle(value))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = cli.writer_config();
    let mut writer = WriteLoop::new(config).context("failed to start writer")?;

    writer.run()
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}
