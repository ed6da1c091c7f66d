//! Blob key type and generation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BlobError;

/// Maximum accepted length for a blob key.
pub const MAX_BLOB_KEY_LEN: usize = 200;

/// Maximum length of the human-readable name suffix in a generated key.
const MAX_NAME_SUFFIX_LEN: usize = 100;

/// A write-once key identifying a stored blob within a tenant's namespace.
///
/// Keys are generated at save time as a collision-resistant random
/// component joined with a sanitized form of the caller-supplied filename:
/// `"{32-hex}-{name}"`. The suffix exists purely for operator traceability;
/// lookup always uses the full key. A key is immutable once returned and is
/// never reassigned to a different object, even after deletion.
///
/// # Examples
///
/// ```
/// use vellum_storage::blob::BlobKey;
///
/// let key = BlobKey::generate("Q3 Report.pdf");
/// assert!(key.as_str().ends_with("-Q3_Report.pdf"));
/// assert!(BlobKey::parse(key.as_str()).is_ok());
/// assert!(BlobKey::parse("../escape").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobKey(String);

impl BlobKey {
    /// Generates a fresh key for an object with the given original name.
    ///
    /// The random component makes concurrent saves collision-free without
    /// any cross-writer coordination.
    pub fn generate(name: &str) -> Self {
        let token = Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}", token, sanitize_name(name)))
    }

    /// Parses and validates a key from untrusted input.
    ///
    /// Rejects empty keys, keys containing path separators or parent-dir
    /// references, and anything outside the generated character set, so a
    /// key can never address a path outside its tenant's directory.
    pub fn parse(key: &str) -> Result<Self, BlobError> {
        if key.is_empty() || key.len() > MAX_BLOB_KEY_LEN {
            return Err(invalid(key, "expected 1-200 characters"));
        }
        if key == "." || key == ".." {
            return Err(invalid(key, "path references are not keys"));
        }
        if !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(invalid(key, "contains characters outside [A-Za-z0-9._-]"));
        }
        Ok(Self(key.to_string()))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn invalid(key: &str, message: &str) -> BlobError {
    BlobError::InvalidKey {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Reduces an arbitrary filename to the key-safe character set.
///
/// Non-key characters map to `_`, leading dots are stripped, and the result
/// is truncated. An unusable name falls back to `"blob"`.
fn sanitize_name(name: &str) -> String {
    let mut cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.len() != cleaned.len() {
        cleaned = trimmed.to_string();
    }
    cleaned.truncate(MAX_NAME_SUFFIX_LEN);

    if cleaned.is_empty() {
        "blob".to_string()
    } else {
        cleaned
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobKey({})", self.0)
    }
}

impl FromStr for BlobKey {
    type Err = BlobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlobKey::parse(s)
    }
}

impl AsRef<str> for BlobKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
