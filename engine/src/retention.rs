//! Age-based removal of files and logs.
//!
//! A file expires when its last-modified calendar date is strictly earlier than
//! `today - days`. Logs and sorted files are disabled by different thresholds:
//! `DELETE_LOGS_AFTER_DAYS` is off for any negative value, while
//! `DELETE_FILES_AFTER_DAYS` is off for zero as well.

use std::path::Path;

use chrono::{Days, NaiveDate};
use tracing::info;

use crate::error::EngineError;
use crate::fs_ops;
use crate::model::FileEntry;

/// An enabled retention threshold in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionWindow {
    days: u64,
}

impl RetentionWindow {
    /// Window for `.log` files. `None` for negative values.
    pub fn for_logs(days: i64) -> Option<Self> {
        (days >= 0).then(|| RetentionWindow { days: days as u64 })
    }

    /// Window for sorted files. `None` for zero or negative values.
    pub fn for_files(days: i64) -> Option<Self> {
        (days > 0).then(|| RetentionWindow { days: days as u64 })
    }

    pub fn days(&self) -> u64 {
        self.days
    }

    /// Oldest modification date that is still kept.
    pub fn cutoff(&self, today: NaiveDate) -> NaiveDate {
        today.checked_sub_days(Days::new(self.days)).unwrap_or(NaiveDate::MIN)
    }

    pub fn is_expired(&self, modified: NaiveDate, today: NaiveDate) -> bool {
        modified < self.cutoff(today)
    }
}

/// Remove `path` if it is older than `window` allows.
///
/// # Returns
/// `true` if the file was removed.
///
/// # Errors
/// Returns `EngineError::ReadError` if the file cannot be stat'ed and
/// `EngineError::RemoveFailed` if removal fails.
pub fn sweep_if_expired(
    path: &Path,
    window: RetentionWindow,
    today: NaiveDate,
) -> Result<bool, EngineError> {
    let entry = FileEntry::from_path(path)?;
    if !window.is_expired(entry.modified_date(), today) {
        return Ok(false);
    }

    fs_ops::remove_file(path)?;
    info!(
        "{} was removed because it was older than {} days",
        path.display(),
        window.days()
    );
    Ok(true)
}
