//! Tracing setup.
//!
//! The TUI owns stderr, so interactive sessions log to a file under the
//! user's data directory. One-shot commands log to stderr.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

pub fn default_log_file() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?;
    Ok(data_dir.join("docflow").join("docflow.log"))
}

/// `RUST_LOG` wins over the configured filter; `info` otherwise.
fn build_filter(configured: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init(target: LogTarget, configured_filter: Option<&str>) -> Result<()> {
    let filter = build_filter(configured_filter);
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match target {
        LogTarget::Stderr => builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow!("setting default subscriber failed: {e}"))?,
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow!("setting default subscriber failed: {e}"))?
        }
    }

    Ok(())
}
