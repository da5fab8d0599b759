//! Content comparison between two files.
//!
//! Files of different sizes are never identical. Files above the large-file
//! threshold are compared chunk by chunk so the comparison can stop at the
//! first difference; smaller files are compared by SHA-256 digest.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tracing::debug;

use crate::checksums::{compute_file_digest, CHUNK_SIZE};
use crate::error::EngineError;
use crate::model::RunStatistics;

/// Files strictly larger than this are compared byte by byte (1 GiB).
pub const LARGE_FILE_THRESHOLD: u64 = 1024 * 1024 * 1024;

/// Decides whether two files have identical contents.
#[derive(Debug, Clone, Copy)]
pub struct ContentComparator {
    size_threshold: u64,
}

impl Default for ContentComparator {
    fn default() -> Self {
        ContentComparator {
            size_threshold: LARGE_FILE_THRESHOLD,
        }
    }
}

impl ContentComparator {
    /// Comparator that switches to byte comparison above `size_threshold` bytes.
    pub fn with_threshold(size_threshold: u64) -> Self {
        ContentComparator { size_threshold }
    }

    pub fn size_threshold(&self) -> u64 {
        self.size_threshold
    }

    /// Compare two files and count a positive result as a duplicate.
    ///
    /// `stats.file_duplicates` is incremented on every `true` result, so only
    /// call this where a match really means "duplicate found".
    ///
    /// # Errors
    /// Returns `EngineError::ReadError` if either file cannot be read. A failed
    /// comparison is neither a match nor a mismatch.
    pub fn same(&self, a: &Path, b: &Path, stats: &mut RunStatistics) -> Result<bool, EngineError> {
        let identical = self.identical(a, b)?;
        if identical {
            stats.file_duplicates += 1;
        }
        Ok(identical)
    }

    /// Compare two files without touching any counters.
    pub fn identical(&self, a: &Path, b: &Path) -> Result<bool, EngineError> {
        let size_a = file_size(a)?;
        let size_b = file_size(b)?;
        if size_a != size_b {
            return Ok(false);
        }

        if size_a > self.size_threshold {
            debug!(a = %a.display(), b = %b.display(), size = size_a, "byte comparison");
            compare_bytes(a, b)
        } else {
            debug!(a = %a.display(), b = %b.display(), size = size_a, "digest comparison");
            Ok(compute_file_digest(a)? == compute_file_digest(b)?)
        }
    }
}

fn file_size(path: &Path) -> Result<u64, EngineError> {
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| EngineError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Stream both files in `CHUNK_SIZE` pieces, stopping at the first difference.
pub fn compare_bytes(a: &Path, b: &Path) -> Result<bool, EngineError> {
    let open = |path: &Path| {
        File::open(path).map_err(|e| EngineError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })
    };
    let mut file_a = open(a)?;
    let mut file_b = open(b)?;

    let mut buf_a = [0u8; CHUNK_SIZE];
    let mut buf_b = [0u8; CHUNK_SIZE];
    loop {
        let n_a = read_chunk(&mut file_a, &mut buf_a).map_err(|e| EngineError::ReadError {
            path: a.to_path_buf(),
            source: e,
        })?;
        let n_b = read_chunk(&mut file_b, &mut buf_b).map_err(|e| EngineError::ReadError {
            path: b.to_path_buf(),
            source: e,
        })?;

        if buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as possible; a short count only happens at EOF.
fn read_chunk(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
