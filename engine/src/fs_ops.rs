//! Filesystem operations module.
//!
//! This module provides the low-level operations the engine is built on:
//! - Listing the regular files and subdirectories of a single directory
//! - Creating destination folders
//! - Moving files without overwriting, with a copy fallback across devices
//! - Removing files
//!
//! Every function maps `io::Error` into an `EngineError` that names the path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::EngineError;

/// List the regular files directly inside `dir`, sorted by name.
///
/// Symlinks are never followed: a link to a file is not a regular file, and
/// a link to a directory is not a subdirectory.
///
/// # Errors
/// Returns `EngineError::EnumerationFailed` if the directory cannot be read.
/// An entry whose type cannot be determined is logged and skipped.
pub fn list_regular_files(dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    list_entries(dir, |file_type| file_type.is_file())
}

/// List the subdirectories directly inside `dir`, sorted by name.
pub fn list_subdirectories(dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    list_entries(dir, |file_type| file_type.is_dir())
}

fn list_entries(
    dir: &Path,
    keep: impl Fn(&fs::FileType) -> bool,
) -> Result<Vec<PathBuf>, EngineError> {
    let entries = fs::read_dir(dir).map_err(|e| EngineError::EnumerationFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| EngineError::EnumerationFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

        // `DirEntry::file_type` does not traverse symlinks.
        match entry.file_type() {
            Ok(file_type) if keep(&file_type) => paths.push(entry.path()),
            Ok(_) => {}
            Err(e) => warn!("Skipping {}: {}", entry.path().display(), e),
        }
    }

    paths.sort();
    Ok(paths)
}

/// Create `dir` if it does not exist.
///
/// # Returns
/// `true` if the directory was created, `false` if it already existed.
///
/// # Errors
/// Returns `EngineError::DirectoryCreationFailed` if creation fails, or
/// `EngineError::NotADirectory` if something other than a directory is in the way.
pub fn ensure_dir(dir: &Path) -> Result<bool, EngineError> {
    match fs::metadata(dir) {
        Ok(metadata) if metadata.is_dir() => Ok(false),
        Ok(_) => Err(EngineError::NotADirectory {
            path: dir.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| EngineError::DirectoryCreationFailed {
                path: dir.to_path_buf(),
                source: e,
            })?;
            Ok(true)
        }
        Err(e) => Err(EngineError::DirectoryCreationFailed {
            path: dir.to_path_buf(),
            source: e,
        }),
    }
}

/// Move `src` to `dst`. Fails instead of overwriting an existing `dst`.
///
/// A plain rename is tried first. If that fails (e.g. across filesystems), the
/// file is copied with its modification time and the source removed.
///
/// # Errors
/// Returns `EngineError::MoveFailed` if the destination exists or neither the
/// rename nor the copy succeed.
pub fn move_file(src: &Path, dst: &Path) -> Result<(), EngineError> {
    if dst.exists() {
        return Err(EngineError::MoveFailed {
            from: src.to_path_buf(),
            to: dst.to_path_buf(),
            source: io::Error::new(io::ErrorKind::AlreadyExists, "destination already exists"),
        });
    }

    let rename_err = match fs::rename(src, dst) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };
    if !src.exists() {
        return Err(EngineError::MoveFailed {
            from: src.to_path_buf(),
            to: dst.to_path_buf(),
            source: rename_err,
        });
    }

    debug!("Rename of {} failed ({}), copying instead", src.display(), rename_err);
    copy_file_with_metadata(src, dst).map_err(|e| EngineError::MoveFailed {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: copy_error_source(e),
    })?;
    remove_file(src)
}

/// Underlying I/O error of a failed copy.
fn copy_error_source(err: EngineError) -> io::Error {
    match err {
        EngineError::ReadError { source, .. } | EngineError::WriteError { source, .. } => source,
        other => io::Error::new(io::ErrorKind::Other, other.to_string()),
    }
}

/// Copy a file to a new destination, preserving its modification time.
///
/// # Returns
/// Number of bytes copied
///
/// # Errors
/// Returns `EngineError::ReadError` or `EngineError::WriteError`. A partially
/// written destination is removed again.
pub fn copy_file_with_metadata(src: &Path, dst: &Path) -> Result<u64, EngineError> {
    let mut src_file = fs::File::open(src).map_err(|e| EngineError::ReadError {
        path: src.to_path_buf(),
        source: e,
    })?;

    let src_mtime = src_file
        .metadata()
        .map_err(|e| EngineError::ReadError {
            path: src.to_path_buf(),
            source: e,
        })?
        .modified()
        .ok();

    let mut dst_file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dst)
        .map_err(|e| EngineError::WriteError {
            path: dst.to_path_buf(),
            source: e,
        })?;

    let bytes_copied = match io::copy(&mut src_file, &mut dst_file) {
        Ok(n) => n,
        Err(e) => {
            drop(dst_file);
            let _ = fs::remove_file(dst);
            return Err(EngineError::WriteError {
                path: dst.to_path_buf(),
                source: e,
            });
        }
    };
    drop(dst_file);

    if let Some(mtime) = src_mtime {
        let _ = filetime::set_file_mtime(dst, filetime::FileTime::from_system_time(mtime));
    }

    Ok(bytes_copied)
}

/// Remove a single file.
pub fn remove_file(path: &Path) -> Result<(), EngineError> {
    fs::remove_file(path).map_err(|e| EngineError::RemoveFailed {
        path: path.to_path_buf(),
        source: e,
    })
}
