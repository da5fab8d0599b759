//! SHA-256 file digests.
//!
//! Used by the content comparator for files below the large-file threshold.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::EngineError;

/// Read buffer size for digesting and byte comparison.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// A computed SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    bytes: [u8; 32],
}

impl FileDigest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Lowercase hex representation
    pub fn hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}

/// Compute the SHA-256 digest of a file, streaming it in `CHUNK_SIZE` reads.
///
/// # Errors
/// Returns `EngineError::ReadError` if the file cannot be opened or read.
pub fn compute_file_digest(path: &Path) -> Result<FileDigest, EngineError> {
    let mut file = File::open(path).map_err(|e| EngineError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buffer[..n]),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(EngineError::ReadError {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        }
    }

    Ok(FileDigest {
        bytes: hasher.finalize().into(),
    })
}
