//! Progress reporting.
//!
//! This module defines the ProgressCallback trait, which decouples the engine
//! from any specific UI technology (CLI, GUI, etc.), and `ProgressState`, a
//! thread-safe snapshot store for observers that poll from another thread.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::model::{FileOutcome, RunState, RunStatistics, SortRun};

/// Trait for receiving progress updates from a sorting run.
///
/// All methods are called synchronously on the thread executing the run.
pub trait ProgressCallback: Send {
    /// Called once before the first phase.
    fn on_run_started(&self, run: &SortRun);

    /// Called when the run enters a new phase.
    fn on_phase_started(&self, run: &SortRun, phase: RunState);

    /// Called before a file is processed.
    fn on_file_started(&self, run: &SortRun, path: &Path);

    /// Called after a file has been processed, whatever the outcome.
    fn on_file_completed(&self, run: &SortRun, path: &Path, outcome: &FileOutcome);

    /// Called once the run reaches `RunState::Done`.
    fn on_run_completed(&self, run: &SortRun);
}

/// Read-only copy of a run's observable state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub task: String,
    pub processed: usize,
    pub total: usize,
    pub stats: RunStatistics,
    pub finished: bool,
}

impl ProgressSnapshot {
    /// Percentage of the current phase completed, 0-100.
    pub fn percent(&self) -> u32 {
        if self.finished {
            100
        } else if self.total == 0 {
            0
        } else {
            ((self.processed as f64 / self.total as f64) * 100.0).min(100.0) as u32
        }
    }
}

/// Shared progress store, updated by the engine thread and polled by a UI.
///
/// The processed/total pair is stored in atomics; the task label and the
/// counters sit behind a mutex. Readers may see slightly stale values but
/// never a torn pair of integers.
#[derive(Debug, Default)]
pub struct ProgressState {
    processed: AtomicUsize,
    total: AtomicUsize,
    finished: AtomicBool,
    task: Mutex<String>,
    stats: Mutex<RunStatistics>,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            task: self.task.lock().map(|t| t.clone()).unwrap_or_default(),
            processed: self.processed.load(Ordering::Acquire),
            total: self.total.load(Ordering::Acquire),
            stats: self.stats.lock().map(|s| *s).unwrap_or_default(),
            finished: self.finished.load(Ordering::Acquire),
        }
    }

    fn update(&self, run: &SortRun) {
        self.processed.store(run.processed, Ordering::Release);
        self.total.store(run.total, Ordering::Release);
        if let Ok(mut task) = self.task.lock() {
            task.clone_from(&run.current_task);
        }
        if let Ok(mut stats) = self.stats.lock() {
            *stats = run.stats;
        }
    }
}

impl ProgressCallback for ProgressState {
    fn on_run_started(&self, run: &SortRun) {
        self.finished.store(false, Ordering::Release);
        self.update(run);
    }

    fn on_phase_started(&self, run: &SortRun, _phase: RunState) {
        self.update(run);
    }

    fn on_file_started(&self, run: &SortRun, _path: &Path) {
        self.update(run);
    }

    fn on_file_completed(&self, run: &SortRun, _path: &Path, _outcome: &FileOutcome) {
        self.update(run);
    }

    fn on_run_completed(&self, run: &SortRun) {
        self.update(run);
        self.finished.store(true, Ordering::Release);
    }
}
