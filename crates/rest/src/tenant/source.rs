//! Tenant source identification.
//!
//! Defines the sources from which tenant information can be extracted.

use std::fmt;

/// Source from which tenant information was extracted.
///
/// Sources are listed in priority order (highest to lowest):
/// 1. Tenant header (`x-tenant-id` by default)
/// 2. `tenant_id` identity claim
/// 3. `tid` identity claim
/// 4. External IdP tenant claim URI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TenantSource {
    /// Tenant extracted from the tenant header (highest priority).
    Header,
    /// Tenant extracted from the primary identity claim.
    TenantIdClaim,
    /// Tenant extracted from the short-form identity claim.
    ShortClaim,
    /// Tenant extracted from the external IdP claim URI (lowest priority).
    ExternalIdpClaim,
}

impl TenantSource {
    /// Returns the priority of this source (higher = more authoritative).
    pub fn priority(&self) -> u8 {
        match self {
            TenantSource::Header => 4,
            TenantSource::TenantIdClaim => 3,
            TenantSource::ShortClaim => 2,
            TenantSource::ExternalIdpClaim => 1,
        }
    }

    /// Returns true if this source is header-based.
    pub fn is_header(&self) -> bool {
        matches!(self, TenantSource::Header)
    }

    /// Returns true if this source is an identity claim.
    pub fn is_claim(&self) -> bool {
        !self.is_header()
    }
}

impl fmt::Display for TenantSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenantSource::Header => write!(f, "header"),
            TenantSource::TenantIdClaim => write!(f, "tenant_id_claim"),
            TenantSource::ShortClaim => write!(f, "short_claim"),
            TenantSource::ExternalIdpClaim => write!(f, "external_idp_claim"),
        }
    }
}

impl Ord for TenantSource {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority().cmp(&other.priority())
    }
}

impl PartialOrd for TenantSource {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
