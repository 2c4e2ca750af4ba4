//! Checksum computation and verification
//!
//! Uses SHA-256 for content integrity fingerprinting. Datastream content
//! attached during ingest is fingerprinted so the logs record exactly what
//! bytes went into the repository.

use crate::error::{DriError, Result};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Compute SHA-256 checksum of bytes
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Compute SHA-256 checksum of a file
pub fn compute_file_checksum(path: impl AsRef<Path>) -> Result<String> {
    let mut file = std::fs::File::open(path.as_ref())?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Verify that data matches the expected checksum
pub fn verify_checksum(data: &[u8], expected: &str) -> Result<()> {
    let actual = compute_checksum(data);
    if actual == expected {
        Ok(())
    } else {
        Err(DriError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Verify that a file matches the expected checksum
pub fn verify_file_checksum(path: impl AsRef<Path>, expected: &str) -> Result<()> {
    let actual = compute_file_checksum(path)?;
    if actual == expected {
        Ok(())
    } else {
        Err(DriError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}
