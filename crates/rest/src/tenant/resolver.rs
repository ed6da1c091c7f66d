//! Tenant resolution from multiple sources.
//!
//! Provides the [`TenantResolver`] which extracts tenant information from
//! requests using multiple configurable sources. Resolution is fail-closed:
//! when no source yields a tenant the request must be rejected, never
//! attributed to a default tenant.

use axum::http::request::Parts;
use vellum_storage::tenant::{TenantId, is_valid_tenant_id};

use crate::config::MultitenancyConfig;

use super::claims::IdentityClaims;
use super::source::TenantSource;

/// Result of resolving a tenant from a request.
#[derive(Debug, Clone)]
pub struct ResolvedTenant {
    /// The resolved tenant ID.
    pub tenant_id: TenantId,
    /// The source from which the tenant was resolved.
    pub source: TenantSource,
    /// All sources that provided a tenant ID (for diagnostics).
    pub all_sources: Vec<(TenantSource, TenantId)>,
}

impl ResolvedTenant {
    /// Returns the tenant ID as a string reference.
    pub fn tenant_id_str(&self) -> &str {
        self.tenant_id.as_str()
    }
}

/// Trait for extracting tenant information from a specific source.
pub trait TenantSourceExtractor: Send + Sync {
    /// Attempts to extract a tenant ID from the request.
    fn extract(&self, parts: &Parts, config: &MultitenancyConfig) -> Option<TenantId>;

    /// Returns the source type this extractor handles.
    fn source_type(&self) -> TenantSource;
}

/// Extracts tenant from the tenant header (name from configuration).
#[derive(Debug, Default)]
pub struct HeaderTenantExtractor;

impl TenantSourceExtractor for HeaderTenantExtractor {
    fn extract(&self, parts: &Parts, config: &MultitenancyConfig) -> Option<TenantId> {
        parts
            .headers
            .get(config.tenant_header.as_str())
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty() && is_valid_tenant_id(s))
            .map(TenantId::new)
    }

    fn source_type(&self) -> TenantSource {
        TenantSource::Header
    }
}

/// Extracts tenant from a named identity claim.
///
/// Claims are populated into request extensions by the authentication layer
/// as [`IdentityClaims`]; this extractor never parses tokens itself.
#[derive(Debug)]
pub struct ClaimTenantExtractor {
    source: TenantSource,
}

impl ClaimTenantExtractor {
    /// Creates an extractor for the given claim-backed source.
    pub fn new(source: TenantSource) -> Self {
        Self { source }
    }

    fn claim_name<'a>(&self, config: &'a MultitenancyConfig) -> &'a str {
        match self.source {
            TenantSource::TenantIdClaim => &config.tenant_claim,
            TenantSource::ShortClaim => &config.short_tenant_claim,
            TenantSource::ExternalIdpClaim => &config.external_tenant_claim,
            TenantSource::Header => "",
        }
    }
}

impl TenantSourceExtractor for ClaimTenantExtractor {
    fn extract(&self, parts: &Parts, config: &MultitenancyConfig) -> Option<TenantId> {
        let claims = parts.extensions.get::<IdentityClaims>()?;
        claims
            .get(self.claim_name(config))
            .filter(|s| is_valid_tenant_id(s))
            .map(TenantId::new)
    }

    fn source_type(&self) -> TenantSource {
        self.source
    }
}

/// Resolves tenant information from multiple sources.
pub struct TenantResolver {
    extractors: Vec<Box<dyn TenantSourceExtractor>>,
}

impl TenantResolver {
    /// Creates a resolver with the full extractor chain in priority order:
    /// header first, then the identity claims.
    pub fn new() -> Self {
        Self {
            extractors: vec![
                Box::new(HeaderTenantExtractor),
                Box::new(ClaimTenantExtractor::new(TenantSource::TenantIdClaim)),
                Box::new(ClaimTenantExtractor::new(TenantSource::ShortClaim)),
                Box::new(ClaimTenantExtractor::new(TenantSource::ExternalIdpClaim)),
            ],
        }
    }

    /// Resolves the tenant from the request.
    ///
    /// Returns `None` when no source provides a tenant; callers must treat
    /// that as a client error, there is no default tenant to fall back to.
    pub fn resolve(&self, parts: &Parts, config: &MultitenancyConfig) -> Option<ResolvedTenant> {
        let mut all_sources = Vec::new();

        // Try each extractor in priority order
        for extractor in &self.extractors {
            if let Some(tenant_id) = extractor.extract(parts, config) {
                all_sources.push((extractor.source_type(), tenant_id));
            }
        }

        // Select the highest priority source that provided a tenant
        all_sources
            .first()
            .cloned()
            .map(|(source, tenant_id)| ResolvedTenant {
                tenant_id,
                source,
                all_sources,
            })
    }
}

impl Default for TenantResolver {
    fn default() -> Self {
        Self::new()
    }
}
