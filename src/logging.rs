//! Diagnostic logging.
//!
//! The TUI owns the terminal, so it logs to a file. One-shot commands log to
//! stderr. Verbosity comes from `RUST_LOG` and defaults to `info`.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "sonicpi-chat.log";

pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Default directory for the log file
pub fn default_log_dir() -> Result<PathBuf> {
    dirs::cache_dir()
        .map(|dir| dir.join("sonicpi-chat"))
        .ok_or_else(|| anyhow!("Could not determine cache directory"))
}

/// Install the global subscriber. Keep the returned guard alive until exit so
/// buffered file output gets flushed.
pub fn init(target: LogTarget) -> Result<Option<WorkerGuard>> {
    match target {
        LogTarget::File(dir) => {
            let (writer, guard) = file_writer(&dir)?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .try_init()
                .map_err(|e| anyhow!("Failed to install logger: {}", e))?;
            Ok(Some(guard))
        }
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init()
                .map_err(|e| anyhow!("Failed to install logger: {}", e))?;
            Ok(None)
        }
    }
}

fn file_writer(dir: &Path) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    Ok(tracing_appender::non_blocking(appender))
}
