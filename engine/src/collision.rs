//! Placing a file into its destination folder when names may collide.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::compare::ContentComparator;
use crate::error::EngineError;
use crate::fs_ops;
use crate::model::{split_extension, Placement, RunStatistics};

/// Move `file` into `destination`, resolving a name collision if there is one.
///
/// - No file of the same name at the destination: move as-is.
/// - Same name, duplicates not allowed, identical contents: delete the source.
/// - Otherwise: move under the first free `<stem>_<N><ext>` name, N ≥ 1.
///
/// The renamed file is moved straight to its new name in `destination`. It is
/// never renamed next to the source first, so a file called `<stem>_<N><ext>`
/// in the source directory is left alone.
///
/// Positive content comparisons are counted in `stats.file_duplicates`; the
/// moved/renamed/removed counters are left to the caller.
///
/// # Errors
/// A failed comparison, move or removal is returned and the source is left in
/// place.
pub fn place(
    file: &Path,
    destination: &Path,
    allow_duplicates: bool,
    comparator: &ContentComparator,
    stats: &mut RunStatistics,
) -> Result<Placement, EngineError> {
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| EngineError::InvalidFileName {
            path: file.to_path_buf(),
        })?;

    let target = destination.join(file_name);
    if !target.exists() {
        fs_ops::move_file(file, &target)?;
        return Ok(Placement::MovedAsIs);
    }

    if !allow_duplicates && comparator.same(file, &target, stats)? {
        fs_ops::remove_file(file)?;
        info!("{} was a duplicate of {} and was removed", file_name, target.display());
        return Ok(Placement::Removed);
    }

    let (new_name, new_target) = next_free_name(destination, file_name);
    fs_ops::move_file(file, &new_target)?;
    info!("{} was renamed to {}", file_name, new_name);
    Ok(Placement::Renamed(new_name))
}

/// Smallest `N ≥ 1` such that `<stem>_<N><ext>` does not exist in `dir`.
pub fn next_free_name(dir: &Path, file_name: &str) -> (String, PathBuf) {
    let (stem, ext) = split_extension(file_name);
    let mut counter: u64 = 1;
    loop {
        let candidate = format!("{}_{}{}", stem, counter, ext);
        let path = dir.join(&candidate);
        if !path.exists() {
            return (candidate, path);
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct Fixture {
        _temp_dir: tempfile::TempDir,
        work: PathBuf,
        dest: PathBuf,
    }

    fn fixture() -> Fixture {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let work = temp_dir.path().to_path_buf();
        let dest = work.join("Docs");
        fs::create_dir(&dest).expect("Failed to create dest");
        Fixture {
            _temp_dir: temp_dir,
            work,
            dest,
        }
    }

    fn place_default(f: &Fixture, name: &str, allow: bool, stats: &mut RunStatistics) -> Placement {
        place(
            &f.work.join(name),
            &f.dest,
            allow,
            &ContentComparator::default(),
            stats,
        )
        .expect("Placement failed")
    }

    #[test]
    fn test_moves_as_is_without_collision() {
        let f = fixture();
        fs::write(f.work.join("report.pdf"), b"v1").unwrap();

        let mut stats = RunStatistics::default();
        assert_eq!(place_default(&f, "report.pdf", false, &mut stats), Placement::MovedAsIs);
        assert!(f.dest.join("report.pdf").exists());
        assert!(!f.work.join("report.pdf").exists());
    }

    #[test]
    fn test_distinct_collisions_number_upwards() {
        let f = fixture();
        fs::write(f.dest.join("report.pdf"), b"original").unwrap();
        let mut stats = RunStatistics::default();

        fs::write(f.work.join("report.pdf"), b"second").unwrap();
        assert_eq!(
            place_default(&f, "report.pdf", false, &mut stats),
            Placement::Renamed("report_1.pdf".to_string())
        );

        fs::write(f.work.join("report.pdf"), b"third!").unwrap();
        assert_eq!(
            place_default(&f, "report.pdf", false, &mut stats),
            Placement::Renamed("report_2.pdf".to_string())
        );

        assert_eq!(fs::read(f.dest.join("report.pdf")).unwrap(), b"original");
        assert_eq!(fs::read(f.dest.join("report_1.pdf")).unwrap(), b"second");
        assert_eq!(fs::read(f.dest.join("report_2.pdf")).unwrap(), b"third!");
        assert_eq!(stats.file_duplicates, 0);
    }

    #[test]
    fn test_rename_leaves_same_named_source_sibling_alone() {
        let f = fixture();
        fs::write(f.dest.join("report.pdf"), b"original").unwrap();
        fs::write(f.work.join("report.pdf"), b"incoming").unwrap();
        fs::write(f.work.join("report_1.pdf"), b"bystander").unwrap();

        let mut stats = RunStatistics::default();
        assert_eq!(
            place_default(&f, "report.pdf", false, &mut stats),
            Placement::Renamed("report_1.pdf".to_string())
        );

        assert_eq!(fs::read(f.dest.join("report_1.pdf")).unwrap(), b"incoming");
        assert_eq!(fs::read(f.work.join("report_1.pdf")).unwrap(), b"bystander");
        assert!(!f.work.join("report.pdf").exists());
    }

    #[test]
    fn test_numbering_fills_smallest_gap() {
        let f = fixture();
        fs::write(f.dest.join("report.pdf"), b"original").unwrap();
        fs::write(f.dest.join("report_2.pdf"), b"two").unwrap();
        fs::write(f.work.join("report.pdf"), b"new").unwrap();

        let mut stats = RunStatistics::default();
        assert_eq!(
            place_default(&f, "report.pdf", false, &mut stats),
            Placement::Renamed("report_1.pdf".to_string())
        );
    }

    #[test]
    fn test_identical_file_is_removed_when_duplicates_disallowed() {
        let f = fixture();
        fs::write(f.dest.join("report.pdf"), b"same").unwrap();
        fs::write(f.work.join("report.pdf"), b"same").unwrap();

        let mut stats = RunStatistics::default();
        assert_eq!(place_default(&f, "report.pdf", false, &mut stats), Placement::Removed);
        assert!(!f.work.join("report.pdf").exists());
        assert!(!f.dest.join("report_1.pdf").exists());
        assert_eq!(fs::read(f.dest.join("report.pdf")).unwrap(), b"same");
        assert_eq!(stats.file_duplicates, 1);
    }

    #[test]
    fn test_identical_file_is_renamed_when_duplicates_allowed() {
        let f = fixture();
        fs::write(f.dest.join("report.pdf"), b"same").unwrap();
        fs::write(f.work.join("report.pdf"), b"same").unwrap();

        let mut stats = RunStatistics::default();
        assert_eq!(
            place_default(&f, "report.pdf", true, &mut stats),
            Placement::Renamed("report_1.pdf".to_string())
        );
        assert_eq!(stats.file_duplicates, 0);
    }

    #[test]
    fn test_next_free_name_edge_cases() {
        let f = fixture();
        fs::write(f.dest.join(".bashrc_1"), b"").unwrap();

        assert_eq!(next_free_name(&f.dest, "README").0, "README_1");
        assert_eq!(next_free_name(&f.dest, "backup.tar.gz").0, "backup.tar_1.gz");
        assert_eq!(next_free_name(&f.dest, ".bashrc").0, ".bashrc_2");
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let f = fixture();
        fs::write(f.dest.join("gone.pdf"), b"x").unwrap();

        let mut stats = RunStatistics::default();
        let result = place(
            &f.work.join("gone.pdf"),
            &f.dest,
            false,
            &ContentComparator::default(),
            &mut stats,
        );
        assert!(result.is_err());
    }
}
