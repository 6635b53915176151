//! SHA-256 content verification.
//!
//! Staged files are digested on copy so a later verification pass can
//! detect anything that changed them.

use std::fmt;
use std::path::Path;

use rolodex_common::error::{Result, RolodexError};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sha256Hash(String);

impl Sha256Hash {
    /// Digests an in-memory buffer.
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    /// Returns the hex-encoded hash string.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.0)
    }
}

/// Computes the SHA-256 hash of a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn hash_file(path: &Path) -> Result<Sha256Hash> {
    tracing::trace!(path = %path.display(), "computing SHA-256 hash");
    let mut file = std::fs::File::open(path).map_err(|e| RolodexError::io(path, e))?;
    let mut hasher = Sha256::new();
    let _ = std::io::copy(&mut file, &mut hasher).map_err(|e| RolodexError::io(path, e))?;
    Ok(Sha256Hash(format!("{:x}", hasher.finalize())))
}

/// Validates that a file matches the expected SHA-256 hash.
///
/// # Errors
///
/// Returns [`RolodexError::HashMismatch`] if the hashes do not match.
pub fn validate_hash(path: &Path, expected: &Sha256Hash) -> Result<()> {
    let actual = hash_file(path)?;
    if &actual != expected {
        return Err(RolodexError::HashMismatch {
            resource: path.display().to_string(),
            expected: expected.as_hex().to_string(),
            actual: actual.as_hex().to_string(),
        });
    }
    Ok(())
}
