//! File logging bootstrap.
//!
//! The terminal belongs to the TUI, so log records only ever go to rotating
//! files inside the data directory.
//!
//! # Invariants
//! - Initialization with the same directory and level is idempotent.
//! - Re-initialization with a different directory or level is rejected.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use once_cell::sync::OnceCell;

const LOG_FILE_BASENAME: &str = "user-roster";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

struct LoggingState {
    level: String,
    log_dir: PathBuf,
    _logger: LoggerHandle,
}

/// Start the file logger at `level` writing into `log_dir`.
pub fn init_logging(level: &str, log_dir: &Path) -> Result<()> {
    let state = LOGGING_STATE.get_or_try_init(|| -> Result<LoggingState> {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("failed to create log directory `{}`", log_dir.display()))?;

        let logger = Logger::try_with_str(level)
            .with_context(|| format!("invalid log level `{level}`"))?
            .log_to_file(
                FileSpec::default()
                    .directory(log_dir)
                    .basename(LOG_FILE_BASENAME),
            )
            .rotate(
                Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(MAX_LOG_FILES),
            )
            .write_mode(WriteMode::BufferAndFlush)
            .append()
            .format_for_files(flexi_logger::detailed_format)
            .start()
            .context("failed to start logger")?;

        info!(
            "event=app_start module=core status=ok platform={} version={} level={}",
            std::env::consts::OS,
            env!("CARGO_PKG_VERSION"),
            level
        );

        Ok(LoggingState {
            level: level.to_string(),
            log_dir: log_dir.to_path_buf(),
            _logger: logger,
        })
    })?;

    if state.log_dir != log_dir {
        return Err(anyhow!(
            "logging already initialized at `{}`; refusing to switch to `{}`",
            state.log_dir.display(),
            log_dir.display()
        ));
    }
    if state.level != level {
        return Err(anyhow!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            state.level,
            level
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent_and_rejects_other_directories() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");

        init_logging("info", &log_dir).unwrap();
        init_logging("info", &log_dir).unwrap();
        assert!(log_dir.is_dir());

        let other = dir.path().join("elsewhere");
        assert!(init_logging("info", &other).is_err());
        assert!(init_logging("debug", &log_dir).is_err());
    }
}
