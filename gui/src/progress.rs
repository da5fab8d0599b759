use filesort_engine::ProgressSnapshot;

/// Console text shown under the progress bar.
pub fn console_text(snapshot: &ProgressSnapshot) -> String {
    let stats = &snapshot.stats;
    format!(
        "Files Found: {}\n\
         Files Removed: {}\n\
         File Duplicates: {}\n\
         Files Moved: {}\n\
         Files Renamed: {}\n\
         Files Ignored: {}\n\
         Files Failed: {}\n\
         Progress: {}/{}",
        stats.files_found,
        stats.files_removed,
        stats.file_duplicates,
        stats.files_moved,
        stats.files_renamed,
        stats.files_ignored,
        stats.files_failed,
        snapshot.processed,
        snapshot.total,
    )
}

/// Status line for the current task.
pub fn status_text(snapshot: &ProgressSnapshot, is_running: bool) -> String {
    if snapshot.finished {
        "Sorting complete.".to_string()
    } else if is_running && snapshot.task.is_empty() {
        "Starting...".to_string()
    } else if is_running {
        snapshot.task.clone()
    } else {
        "Ready".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_text_lists_counters() {
        let mut snapshot = ProgressSnapshot::default();
        snapshot.stats.files_found = 7;
        snapshot.stats.files_moved = 3;
        snapshot.processed = 2;
        snapshot.total = 5;

        let text = console_text(&snapshot);
        assert!(text.contains("Files Found: 7"));
        assert!(text.contains("Files Moved: 3"));
        assert!(text.ends_with("Progress: 2/5"));
    }

    #[test]
    fn test_status_text() {
        let mut snapshot = ProgressSnapshot::default();
        assert_eq!(status_text(&snapshot, false), "Ready");
        assert_eq!(status_text(&snapshot, true), "Starting...");

        snapshot.task = "Sorting files".to_string();
        assert_eq!(status_text(&snapshot, true), "Sorting files");

        snapshot.finished = true;
        assert_eq!(status_text(&snapshot, true), "Sorting complete.");
    }
}
