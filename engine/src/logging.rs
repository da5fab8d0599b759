//! Logging setup shared by the CLI and the GUI.
//!
//! Events go to a dated file in the logs directory
//! (`OutputLog_<DD_MM_YYYY>.log`) and, at a higher threshold, to stderr.
//! The file filter can be overridden with the `FILESORT_LOG` environment
//! variable using `tracing-subscriber` directive syntax.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::NaiveDate;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the file log filter.
pub const LOG_FILTER_ENV: &str = "FILESORT_LOG";

/// Default logs directory name, created next to the configuration file.
pub const LOGS_DIR_NAME: &str = "logs";

/// Name of the log file written on `date`.
pub fn log_file_name(date: NaiveDate) -> String {
    format!("OutputLog_{}.log", date.format("%d_%m_%Y"))
}

/// Logs directory belonging to a configuration file path.
pub fn logs_dir_for(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(LOGS_DIR_NAME),
        _ => PathBuf::from(LOGS_DIR_NAME),
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for as long as logging is needed. Calling this twice leaves the first
/// subscriber in place.
///
/// # Errors
/// Returns an error if the logs directory cannot be created.
pub fn init_logging(logs_dir: &Path, verbose: bool) -> io::Result<WorkerGuard> {
    fs::create_dir_all(logs_dir)?;

    let today = chrono::Local::now().date_naive();
    let file_appender = tracing_appender::rolling::never(logs_dir, log_file_name(today));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    let console_level = if verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .without_time()
                .with_target(false)
                .with_filter(console_level),
        )
        .try_init();

    Ok(guard)
}

/// Most recently modified `.log` file in `logs_dir`, if any.
pub fn latest_log_file(logs_dir: &Path) -> io::Result<Option<PathBuf>> {
    let mut latest: Option<(SystemTime, PathBuf)> = None;
    for entry in fs::read_dir(logs_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("log") {
            continue;
        }
        let metadata = fs::metadata(&path)?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified()?;
        if latest.as_ref().map_or(true, |(t, _)| modified > *t) {
            latest = Some((modified, path));
        }
    }
    Ok(latest.map(|(_, path)| path))
}
