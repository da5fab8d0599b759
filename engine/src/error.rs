//! Error types for the sorting engine.
//!
//! There are two error families:
//! - `ConfigError`: the configuration file could not be turned into a valid
//!   `SortConfig`. Always fatal at startup.
//! - `EngineError`: a filesystem operation failed. Run-level failures (working
//!   directory missing, folder creation) abort the run; per-file failures are
//!   caught by the engine and recorded on the `SortRun` instead.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading, validating or saving the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration file at the given path
    #[error("Configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The file was missing and a template has been written in its place
    #[error("Configuration file was missing; a template was written to {}, please edit it", path.display())]
    TemplateCreated { path: PathBuf },

    #[error("Failed to read configuration file: {}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write configuration file: {}", path.display())]
    Write { path: PathBuf, source: io::Error },

    /// Malformed JSON, or a missing, unknown or mistyped key
    #[error("Invalid configuration in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Structurally valid JSON whose values break an invariant
    #[error("Invalid configuration: {reason}")]
    Invalid { reason: String },
}

/// Errors that can occur while sorting.
///
/// Variants carrying an `io::Error` keep it as `source`, so the OS error code
/// can be recovered with [`EngineError::raw_os_error`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// Working directory does not exist
    #[error("Working directory not found: {}", path.display())]
    WorkingDirectoryNotFound { path: PathBuf },

    /// Working directory exists but is not accessible
    #[error("Working directory access denied: {}", path.display())]
    WorkingDirectoryAccessDenied { path: PathBuf, source: io::Error },

    /// A path that must be a directory is something else
    #[error("Not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    /// Failed to enumerate a directory
    #[error("Failed to enumerate directory: {}", path.display())]
    EnumerationFailed { path: PathBuf, source: io::Error },

    /// Failed to create a directory
    #[error("Failed to create directory: {}", path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    /// Failed to read a file or its metadata
    #[error("Failed to read file: {}", path.display())]
    ReadError { path: PathBuf, source: io::Error },

    /// Failed to write a file
    #[error("Failed to write file: {}", path.display())]
    WriteError { path: PathBuf, source: io::Error },

    /// Failed to move or rename a file
    #[error("Failed to move {} to {}", from.display(), to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    /// Failed to delete a file
    #[error("Failed to remove file: {}", path.display())]
    RemoveFailed { path: PathBuf, source: io::Error },

    /// File name is not valid UTF-8 or has no final component
    #[error("Invalid file name: {}", path.display())]
    InvalidFileName { path: PathBuf },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Extract the OS error code from this error, if available.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::WorkingDirectoryAccessDenied { source, .. }
            | Self::EnumerationFailed { source, .. }
            | Self::DirectoryCreationFailed { source, .. }
            | Self::ReadError { source, .. }
            | Self::WriteError { source, .. }
            | Self::MoveFailed { source, .. }
            | Self::RemoveFailed { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }

    /// True if the underlying OS error says the path does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::WorkingDirectoryNotFound { .. } => true,
            Self::WorkingDirectoryAccessDenied { source, .. }
            | Self::EnumerationFailed { source, .. }
            | Self::DirectoryCreationFailed { source, .. }
            | Self::ReadError { source, .. }
            | Self::WriteError { source, .. }
            | Self::MoveFailed { source, .. }
            | Self::RemoveFailed { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// The file or directory this error is about, if there is exactly one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::WorkingDirectoryNotFound { path }
            | Self::WorkingDirectoryAccessDenied { path, .. }
            | Self::NotADirectory { path }
            | Self::EnumerationFailed { path, .. }
            | Self::DirectoryCreationFailed { path, .. }
            | Self::ReadError { path, .. }
            | Self::WriteError { path, .. }
            | Self::RemoveFailed { path, .. }
            | Self::InvalidFileName { path } => Some(path),
            Self::MoveFailed { from, .. } => Some(from),
            Self::Config(_) => None,
        }
    }
}
