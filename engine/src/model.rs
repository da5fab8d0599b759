//! Core data model for sorting runs.
//!
//! This module defines the main data structures:
//! - SortRun: the state and results of one sorting pass
//! - RunStatistics: cumulative counters reported at the end of a run
//! - FileEntry: a file observed on disk during a pass
//! - RunState, Placement, FileOutcome: enums describing progress and results

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDate};
use uuid::Uuid;

use crate::error::EngineError;

/// One sorting pass over the working directory.
///
/// A SortRun is created by the engine, threaded through every phase, and
/// returned to the caller once the run reaches `RunState::Done`.
#[derive(Debug, Clone)]
pub struct SortRun {
    /// Unique identifier for this run
    pub id: Uuid,

    /// Current phase
    pub state: RunState,

    /// Whether the tree-wide duplicate elimination phase was requested
    pub remove_duplicates: bool,

    /// Cumulative counters
    pub stats: RunStatistics,

    /// Human-readable description of the current task
    pub current_task: String,

    /// Files processed in the current phase
    pub processed: usize,

    /// Files to process in the current phase
    pub total: usize,

    /// Per-file errors that were isolated instead of aborting the run
    pub failures: Vec<FileFailure>,

    /// When the run started
    pub start_time: Option<SystemTime>,

    /// When the run reached Done
    pub end_time: Option<SystemTime>,
}

impl SortRun {
    pub fn new(remove_duplicates: bool) -> Self {
        SortRun {
            id: Uuid::new_v4(),
            state: RunState::Idle,
            remove_duplicates,
            stats: RunStatistics::default(),
            current_task: String::new(),
            processed: 0,
            total: 0,
            failures: Vec::new(),
            start_time: None,
            end_time: None,
        }
    }

    /// Record an isolated per-file error.
    pub fn record_failure(&mut self, path: &Path, error: &EngineError) {
        self.stats.files_failed += 1;
        self.failures.push(FileFailure {
            path: path.to_path_buf(),
            error_code: error.raw_os_error(),
            error_message: error.to_string(),
        });
    }

    /// Percentage of the current phase completed, 0-100.
    pub fn percent_complete(&self) -> u32 {
        if self.state == RunState::Done {
            return 100;
        }
        if self.total == 0 {
            return 0;
        }
        ((self.processed as f64 / self.total as f64) * 100.0) as u32
    }
}

/// Cumulative counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStatistics {
    pub files_found: u64,
    pub files_removed: u64,
    /// Positive content comparisons, not unique duplicate files
    pub file_duplicates: u64,
    pub files_moved: u64,
    pub files_renamed: u64,
    pub files_ignored: u64,
    pub files_failed: u64,
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Files found: {}", self.files_found)?;
        writeln!(f, "Files removed: {}", self.files_removed)?;
        writeln!(f, "File duplicates: {}", self.file_duplicates)?;
        writeln!(f, "Files moved: {}", self.files_moved)?;
        writeln!(f, "Files renamed: {}", self.files_renamed)?;
        writeln!(f, "Files ignored: {}", self.files_ignored)?;
        write!(f, "Files failed: {}", self.files_failed)
    }
}

/// A per-file error that did not stop the run.
#[derive(Debug, Clone)]
pub struct FileFailure {
    pub path: PathBuf,
    /// OS error code, if the failure came from the OS
    pub error_code: Option<i32>,
    pub error_message: String,
}

/// Phases of a sorting run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Created, not yet started
    Idle,
    /// Creating missing destination folders
    EnsuringFolders,
    /// Moving top-level files into their folders
    Classifying,
    /// Removing expired logs and files
    Sweeping,
    /// Removing byte-identical files across the tree
    DeduplicatingTree,
    /// Finished; statistics are final
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "Idle"),
            RunState::EnsuringFolders => write!(f, "Checking folders"),
            RunState::Classifying => write!(f, "Sorting files"),
            RunState::Sweeping => write!(f, "Removing expired files"),
            RunState::DeduplicatingTree => write!(f, "Removing duplicates"),
            RunState::Done => write!(f, "Done"),
        }
    }
}

/// Result of placing one file into its destination folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Moved under its original name
    MovedAsIs,
    /// Moved under a disambiguated name
    Renamed(String),
    /// Identical to the file already at the destination; source deleted
    Removed,
}

/// What happened to a single file during a run, as reported to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Placed { folder: String, placement: Placement },
    Ignored,
    Expired,
    DuplicateRemoved { original: PathBuf },
    Kept,
    Failed { message: String },
}

/// A regular file observed on disk.
///
/// Recomputed from the filesystem every pass; never cached across runs.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

impl FileEntry {
    /// Stat `path` and build an entry.
    ///
    /// # Errors
    /// Returns `EngineError::ReadError` if the metadata cannot be read.
    pub fn from_path(path: &Path) -> Result<Self, EngineError> {
        let metadata = fs::metadata(path).map_err(|e| EngineError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let modified = metadata.modified().map_err(|e| EngineError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(FileEntry {
            path: path.to_path_buf(),
            size: metadata.len(),
            modified,
        })
    }

    /// Final path component as UTF-8.
    pub fn file_name(&self) -> Result<&str, EngineError> {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| EngineError::InvalidFileName {
                path: self.path.clone(),
            })
    }

    /// Extension including the leading dot, or "" if there is none.
    pub fn suffix(&self) -> &str {
        match self.path.file_name().and_then(|n| n.to_str()) {
            Some(name) => split_extension(name).1,
            None => "",
        }
    }

    /// Local calendar date of the last modification.
    pub fn modified_date(&self) -> NaiveDate {
        DateTime::<Local>::from(self.modified).date_naive()
    }
}

/// Split a file name into stem and final extension (with its dot).
///
/// Leading dots belong to the stem, so `.bashrc` has no extension while
/// `archive.tar.gz` splits into `archive.tar` and `.gz`.
pub fn split_extension(name: &str) -> (&str, &str) {
    let leading = name.len() - name.trim_start_matches('.').len();
    match name[leading..].rfind('.') {
        Some(pos) => name.split_at(leading + pos),
        None => (name, ""),
    }
}
