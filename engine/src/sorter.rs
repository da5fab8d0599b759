//! Sorting run orchestration.
//!
//! `SortEngine::run` drives one pass through the phases
//! `EnsuringFolders → Classifying → Sweeping → (DeduplicatingTree) → Done`:
//! - destination folders are created if missing (failure aborts the run)
//! - each top-level file is placed into the first folder whose suffix matches
//! - expired logs and files are removed
//! - optionally, byte-identical files are removed directory by directory
//!
//! Failures on individual files are recorded on the `SortRun` and the pass
//! carries on with the next file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, info_span, warn};
use walkdir::WalkDir;

use crate::collision;
use crate::compare::ContentComparator;
use crate::config::SortConfig;
use crate::error::EngineError;
use crate::fs_ops;
use crate::model::{FileOutcome, Placement, RunState, RunStatistics, SortRun};
use crate::placement;
use crate::progress::ProgressCallback;
use crate::retention::{self, RetentionWindow};

/// Options chosen per invocation rather than in the configuration file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Run the tree-wide duplicate elimination phase (`rm_duplicates`)
    pub remove_duplicates: bool,
}

/// The classification, retention and deduplication engine.
///
/// Not reentrant: two runs over the same working directory must not overlap.
#[derive(Debug, Clone)]
pub struct SortEngine {
    config: SortConfig,
    logs_dir: Option<PathBuf>,
    comparator: ContentComparator,
}

impl SortEngine {
    /// Create an engine for a validated configuration.
    ///
    /// # Errors
    /// Returns `EngineError::Config` if the configuration breaks an invariant,
    /// and `WorkingDirectoryNotFound` / `NotADirectory` /
    /// `WorkingDirectoryAccessDenied` if the working directory is unusable.
    pub fn new(config: SortConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let working_dir = &config.download_folder_path;
        match std::fs::metadata(working_dir) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => {
                return Err(EngineError::NotADirectory {
                    path: working_dir.clone(),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EngineError::WorkingDirectoryNotFound {
                    path: working_dir.clone(),
                })
            }
            Err(e) => {
                return Err(EngineError::WorkingDirectoryAccessDenied {
                    path: working_dir.clone(),
                    source: e,
                })
            }
        }

        Ok(SortEngine {
            config,
            logs_dir: None,
            comparator: ContentComparator::default(),
        })
    }

    /// Directory whose `.log` files are subject to log retention.
    pub fn with_logs_dir(mut self, logs_dir: impl Into<PathBuf>) -> Self {
        self.logs_dir = Some(logs_dir.into());
        self
    }

    pub fn with_comparator(mut self, comparator: ContentComparator) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    pub fn working_dir(&self) -> &Path {
        &self.config.download_folder_path
    }

    /// Run a full pass using today's local date for retention.
    pub fn run(
        &self,
        options: RunOptions,
        progress: Option<&dyn ProgressCallback>,
    ) -> Result<SortRun, EngineError> {
        self.run_on(Local::now().date_naive(), options, progress)
    }

    /// Run a full pass with an explicit reference date for retention.
    ///
    /// # Errors
    /// Only run-level failures are returned: folder creation, or an unreadable
    /// working directory. Per-file errors end up in `SortRun::failures`.
    pub fn run_on(
        &self,
        today: NaiveDate,
        options: RunOptions,
        progress: Option<&dyn ProgressCallback>,
    ) -> Result<SortRun, EngineError> {
        let mut run = SortRun::new(options.remove_duplicates);
        let span = info_span!("sort_run", id = %run.id);
        let _enter = span.enter();

        run.start_time = Some(SystemTime::now());
        info!(working_dir = %self.working_dir().display(), "Starting sort run");
        if let Some(callback) = progress {
            callback.on_run_started(&run);
        }

        enter_phase(&mut run, RunState::EnsuringFolders, progress);
        self.ensure_folders()?;

        enter_phase(&mut run, RunState::Classifying, progress);
        self.classify(&mut run, progress)?;
        info!("All files were sorted!");

        enter_phase(&mut run, RunState::Sweeping, progress);
        self.sweep(&mut run, today, progress)?;

        if options.remove_duplicates {
            enter_phase(&mut run, RunState::DeduplicatingTree, progress);
            info!("Removing duplicates");
            self.deduplicate_tree(self.working_dir(), &mut run, progress)?;
            info!("All duplicates were removed!");
        }

        run.state = RunState::Done;
        run.current_task = RunState::Done.to_string();
        run.end_time = Some(SystemTime::now());
        log_statistics(&run.stats);
        if let Some(callback) = progress {
            callback.on_run_completed(&run);
        }

        Ok(run)
    }

    /// Create every configured folder that does not exist yet. Idempotent.
    ///
    /// # Errors
    /// Any creation failure is returned; the run cannot place files without
    /// its destinations.
    pub fn ensure_folders(&self) -> Result<(), EngineError> {
        for rule in self.config.folders.iter() {
            let dir = self.working_dir().join(&rule.name);
            if fs_ops::ensure_dir(&dir)? {
                info!("Folder {} was created!", rule.name);
            } else {
                info!("Folder {} was found.", rule.name);
            }
        }
        Ok(())
    }

    /// Place every regular file directly inside the working directory.
    ///
    /// # Errors
    /// Returns `EngineError::EnumerationFailed` if the working directory
    /// cannot be listed.
    pub fn classify(
        &self,
        run: &mut SortRun,
        progress: Option<&dyn ProgressCallback>,
    ) -> Result<(), EngineError> {
        let files = fs_ops::list_regular_files(self.working_dir())?;
        run.total = files.len();
        run.processed = 0;

        for path in files {
            run.current_task = format!("Sorting {}", display_name(&path));
            if let Some(callback) = progress {
                callback.on_file_started(run, &path);
            }

            run.stats.files_found += 1;
            info!("File {} was found.", display_name(&path));

            let outcome = match self.classify_file(&path, &mut run.stats) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Could not sort {}: {}", path.display(), e);
                    run.record_failure(&path, &e);
                    FileOutcome::Failed {
                        message: e.to_string(),
                    }
                }
            };

            run.processed += 1;
            if let Some(callback) = progress {
                callback.on_file_completed(run, &path, &outcome);
            }
        }
        Ok(())
    }

    fn classify_file(
        &self,
        path: &Path,
        stats: &mut RunStatistics,
    ) -> Result<FileOutcome, EngineError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| EngineError::InvalidFileName {
                path: path.to_path_buf(),
            })?;

        let Some(rule) = placement::resolve(file_name, &self.config.folders) else {
            warn!("No folder for {}", file_name);
            stats.files_ignored += 1;
            return Ok(FileOutcome::Ignored);
        };

        let destination = self.working_dir().join(&rule.name);
        let placed = collision::place(
            path,
            &destination,
            self.config.allow_duplicates,
            &self.comparator,
            stats,
        )?;

        match &placed {
            Placement::MovedAsIs => {
                stats.files_moved += 1;
                info!("{} was moved to {}", file_name, rule.name);
            }
            Placement::Renamed(new_name) => {
                stats.files_renamed += 1;
                stats.files_moved += 1;
                info!("{} was moved to {}", new_name, rule.name);
            }
            Placement::Removed => {
                stats.files_removed += 1;
            }
        }

        Ok(FileOutcome::Placed {
            folder: rule.name.clone(),
            placement: placed,
        })
    }

    /// Remove expired `.log` files and, if file retention is enabled, expired
    /// files in the working directory and one level of subdirectories.
    ///
    /// # Errors
    /// Returns `EngineError::EnumerationFailed` if the working directory cannot
    /// be listed. Unreadable subdirectories and the logs directory are recorded
    /// as failures instead.
    pub fn sweep(
        &self,
        run: &mut SortRun,
        today: NaiveDate,
        progress: Option<&dyn ProgressCallback>,
    ) -> Result<(), EngineError> {
        let mut targets: Vec<(PathBuf, RetentionWindow)> = Vec::new();

        if let (Some(window), Some(logs_dir)) = (
            RetentionWindow::for_logs(self.config.delete_logs_after_days),
            self.logs_dir.as_deref(),
        ) {
            if logs_dir.is_dir() {
                match fs_ops::list_regular_files(logs_dir) {
                    Ok(files) => targets.extend(
                        files
                            .into_iter()
                            .filter(|p| p.to_string_lossy().ends_with(".log"))
                            .map(|p| (p, window)),
                    ),
                    Err(e) => {
                        warn!("Could not list logs: {}", e);
                        run.record_failure(logs_dir, &e);
                    }
                }
            } else {
                debug!("No logs directory at {}", logs_dir.display());
            }
        }

        if let Some(window) = RetentionWindow::for_files(self.config.delete_files_after_days) {
            let work = self.working_dir();
            targets.extend(
                fs_ops::list_regular_files(work)?
                    .into_iter()
                    .map(|p| (p, window)),
            );
            for subdir in fs_ops::list_subdirectories(work)? {
                match fs_ops::list_regular_files(&subdir) {
                    Ok(files) => targets.extend(files.into_iter().map(|p| (p, window))),
                    Err(e) => {
                        warn!("Could not list {}: {}", subdir.display(), e);
                        run.record_failure(&subdir, &e);
                    }
                }
            }
        }

        // The logs directory may itself sit one level below the working directory.
        let mut seen = HashSet::new();
        targets.retain(|(path, _)| seen.insert(path.clone()));

        run.total = targets.len();
        run.processed = 0;
        for (path, window) in targets {
            run.current_task = format!("Checking age of {}", display_name(&path));
            if let Some(callback) = progress {
                callback.on_file_started(run, &path);
            }

            let outcome = match retention::sweep_if_expired(&path, window, today) {
                Ok(true) => {
                    run.stats.files_removed += 1;
                    FileOutcome::Expired
                }
                Ok(false) => FileOutcome::Kept,
                Err(e) if e.is_not_found() => {
                    debug!("{} is already gone", path.display());
                    FileOutcome::Kept
                }
                Err(e) => {
                    warn!("Could not check age of {}: {}", path.display(), e);
                    run.record_failure(&path, &e);
                    FileOutcome::Failed {
                        message: e.to_string(),
                    }
                }
            };

            run.processed += 1;
            if let Some(callback) = progress {
                callback.on_file_completed(run, &path, &outcome);
            }
        }
        Ok(())
    }

    /// Remove byte-identical files within each directory of the tree at `root`.
    ///
    /// Directories are visited depth-first in name order. Symlinks are not
    /// followed. Files are only compared with other files in the same
    /// directory.
    ///
    /// # Errors
    /// Returns `EngineError::EnumerationFailed` if `root` cannot be listed.
    /// Unreadable subdirectories are recorded as failures and skipped.
    pub fn deduplicate_tree(
        &self,
        root: &Path,
        run: &mut SortRun,
        progress: Option<&dyn ProgressCallback>,
    ) -> Result<(), EngineError> {
        let mut dirs = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_dir() => dirs.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    let at_root = e.depth() == 0;
                    let err = EngineError::EnumerationFailed {
                        path,
                        source: e.into(),
                    };
                    if at_root {
                        return Err(err);
                    }
                    warn!("Could not walk the tree: {}", err);
                    run.record_failure(err.path().unwrap_or(root), &err);
                }
            }
        }

        for dir in dirs {
            let files = match fs_ops::list_regular_files(&dir) {
                Ok(files) => files,
                Err(e) if dir == root => return Err(e),
                Err(e) => {
                    warn!("Could not list {}: {}", dir.display(), e);
                    run.record_failure(&dir, &e);
                    continue;
                }
            };

            debug!("Directory listing for {}: {} files", dir.display(), files.len());
            self.deduplicate_dir(&dir, &files, run, progress);
        }
        Ok(())
    }

    fn deduplicate_dir(
        &self,
        dir: &Path,
        files: &[PathBuf],
        run: &mut SortRun,
        progress: Option<&dyn ProgressCallback>,
    ) {
        run.current_task = format!("Removing duplicates in {}", dir.display());
        run.total = files.len();
        run.processed = 0;
        let mut removed = vec![false; files.len()];

        for i in 0..files.len() {
            run.processed = i;
            if removed[i] {
                continue;
            }
            let original = &files[i];
            if let Some(callback) = progress {
                callback.on_file_started(run, original);
            }

            for j in (i + 1)..files.len() {
                if removed[j] {
                    continue;
                }
                let candidate = &files[j];

                match self.comparator.same(original, candidate, &mut run.stats) {
                    Ok(true) => match fs_ops::remove_file(candidate) {
                        Ok(()) => {
                            removed[j] = true;
                            run.stats.files_removed += 1;
                            info!(
                                "{} was a duplicate of {} and was removed",
                                display_name(candidate),
                                display_name(original)
                            );
                            if let Some(callback) = progress {
                                callback.on_file_completed(
                                    run,
                                    candidate,
                                    &FileOutcome::DuplicateRemoved {
                                        original: original.clone(),
                                    },
                                );
                            }
                        }
                        Err(e) => {
                            warn!("Could not remove duplicate {}: {}", candidate.display(), e);
                            run.record_failure(candidate, &e);
                        }
                    },
                    Ok(false) => {}
                    Err(e) => {
                        warn!(
                            "Comparison of {} and {} failed: {}",
                            original.display(),
                            candidate.display(),
                            e
                        );
                        let failed_path = e.path().map(Path::to_path_buf).unwrap_or(candidate.clone());
                        run.record_failure(&failed_path, &e);
                        // Nothing more can be learned about an unreadable original.
                        if failed_path == *original {
                            break;
                        }
                    }
                }
            }

            run.processed = i + 1;
            if let Some(callback) = progress {
                callback.on_file_completed(run, original, &FileOutcome::Kept);
            }
        }
        run.processed = files.len();
    }
}

/// Move into `phase`, resetting the per-phase progress pair.
fn enter_phase(run: &mut SortRun, phase: RunState, progress: Option<&dyn ProgressCallback>) {
    run.state = phase;
    run.current_task = phase.to_string();
    run.processed = 0;
    run.total = 0;
    debug!(phase = ?phase, "Entering phase");
    if let Some(callback) = progress {
        callback.on_phase_started(run, phase);
    }
}

fn log_statistics(stats: &RunStatistics) {
    info!("Files found: {}", stats.files_found);
    info!("Files removed: {}", stats.files_removed);
    info!("File duplicates: {}", stats.file_duplicates);
    info!("Files moved: {}", stats.files_moved);
    info!("Files renamed: {}", stats.files_renamed);
    info!("Files ignored: {}", stats.files_ignored);
    if stats.files_failed > 0 {
        warn!("Files failed: {}", stats.files_failed);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
