use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver};
use filesort_engine::{ProgressState, RunOptions, RunStatistics, SortConfig, SortEngine};

/// Result of a finished run, as shown by the GUI.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stats: RunStatistics,
    pub failed_items: Vec<(String, String)>,
}

/// Spawn a background thread that performs one sorting run.
///
/// Progress is published through `progress`; the final result arrives on the
/// returned channel.
pub fn spawn_sort(
    config: SortConfig,
    logs_dir: PathBuf,
    remove_duplicates: bool,
    progress: Arc<ProgressState>,
) -> Receiver<Result<RunSummary, String>> {
    let (tx, rx) = unbounded();

    thread::spawn(move || {
        let result = execute_sort(config, logs_dir, remove_duplicates, &progress);
        match &result {
            Ok(summary) => tracing::info!(
                failed = summary.failed_items.len(),
                "Sort finished"
            ),
            Err(e) => tracing::error!(error = %e, "Sort failed"),
        }
        // The receiver is gone if the window was closed mid-run.
        let _ = tx.send(result);
    });

    rx
}

fn execute_sort(
    config: SortConfig,
    logs_dir: PathBuf,
    remove_duplicates: bool,
    progress: &ProgressState,
) -> Result<RunSummary, String> {
    let engine = SortEngine::new(config)
        .map_err(|e| format!("Cannot start: {}", e))?
        .with_logs_dir(logs_dir);

    let run = engine
        .run(RunOptions { remove_duplicates }, Some(progress))
        .map_err(|e| format!("Sort failed: {}", e))?;

    let failed_items = run
        .failures
        .iter()
        .map(|f| {
            let name = f
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| f.path.display().to_string());
            (name, f.error_message.clone())
        })
        .collect();

    Ok(RunSummary {
        stats: run.stats,
        failed_items,
    })
}
