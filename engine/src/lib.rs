//! # FileSort Engine - Download Folder Organizer
//!
//! A headless engine that keeps a download folder tidy. It is the foundation
//! for the `filesort` CLI and the desktop GUI.
//!
//! ## Overview
//!
//! One sorting run:
//! - Creates the configured destination folders if they are missing
//! - Moves every top-level file into the first folder whose suffix matches
//! - Removes byte-identical duplicates, or renames colliding files `name_1.ext`
//! - Purges logs and files older than the configured retention windows
//! - Optionally removes duplicates across the whole directory tree
//!
//! Per-file errors are isolated and recorded on the returned `SortRun`.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use std::path::Path;
//! use filesort_engine::{RunOptions, SortConfig, SortEngine};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SortConfig::load(Path::new("config.json"))?;
//! let engine = SortEngine::new(config)?.with_logs_dir("logs");
//!
//! let run = engine.run(RunOptions { remove_duplicates: false }, None)?;
//! println!("{}", run.stats);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **config**: Configuration file schema, loading and validation
//! - **model**: Core data structures (SortRun, RunStatistics, FileEntry, enums)
//! - **error**: Error types and handling
//! - **fs_ops**: Low-level filesystem operations
//! - **checksums**: SHA-256 file digests
//! - **compare**: Content comparison between two files
//! - **placement**: Suffix-based destination lookup
//! - **collision**: Name collision handling at the destination
//! - **retention**: Age-based removal
//! - **sorter**: Run orchestration (SortEngine)
//! - **progress**: Progress callback trait and shared progress state
//! - **logging**: Subscriber setup and log file helpers

pub mod config;
pub mod model;
pub mod error;
pub mod fs_ops;
pub mod checksums;
pub mod compare;
pub mod placement;
pub mod collision;
pub mod retention;
pub mod sorter;
pub mod progress;
pub mod logging;

// Re-export main types and functions
pub use config::{FolderMap, FolderRule, SortConfig, DEFAULT_CONFIG_FILE};
pub use model::{
    FileEntry, FileFailure, FileOutcome, Placement, RunState, RunStatistics, SortRun,
};
pub use error::{ConfigError, EngineError};
pub use compare::ContentComparator;
pub use sorter::{RunOptions, SortEngine};
pub use progress::{ProgressCallback, ProgressSnapshot, ProgressState};
