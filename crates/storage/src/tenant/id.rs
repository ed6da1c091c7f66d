//! Tenant identifier type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TenantError;

/// Maximum accepted length for a tenant identifier.
pub const MAX_TENANT_ID_LEN: usize = 64;

/// An opaque tenant identifier.
///
/// Every operation in the system executes under exactly one `TenantId`. The
/// identifier is supplied by the caller (request header or identity claim)
/// and is never inferred from stored data.
///
/// # Examples
///
/// ```
/// use vellum_storage::tenant::TenantId;
///
/// let tenant = TenantId::new("acme");
/// assert_eq!(tenant.as_str(), "acme");
/// assert!(TenantId::parse("").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a tenant ID from a trusted value.
    ///
    /// Use [`TenantId::parse`] for anything that arrived over the wire.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parses and validates a tenant ID from untrusted input.
    ///
    /// Accepts non-empty identifiers of at most [`MAX_TENANT_ID_LEN`]
    /// ASCII-alphanumeric characters, hyphens, and underscores. Anything
    /// else is rejected so a tenant id can never smuggle path components
    /// into the storage layout.
    pub fn parse(id: &str) -> Result<Self, TenantError> {
        if !is_valid_tenant_id(id) {
            return Err(TenantError::Invalid {
                tenant_id: id.to_string(),
                message: format!(
                    "expected 1-{} characters from [A-Za-z0-9_-]",
                    MAX_TENANT_ID_LEN
                ),
            });
        }
        Ok(Self(id.to_string()))
    }

    /// Returns the tenant ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Returns `true` if the string is a well-formed tenant identifier.
pub fn is_valid_tenant_id(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_TENANT_ID_LEN
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TenantId({})", self.0)
    }
}

impl FromStr for TenantId {
    type Err = TenantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TenantId::parse(s)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        TenantId::new(s)
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        TenantId::new(s)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
