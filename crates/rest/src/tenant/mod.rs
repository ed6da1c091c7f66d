//! Multi-source tenant resolution.
//!
//! This module provides tenant identification from multiple sources:
//!
//! - **Tenant header**: `x-tenant-id` (name configurable)
//! - **Identity claims**: verified claims placed in request extensions by
//!   the authentication layer (`tenant_id`, `tid`, or the external IdP
//!   claim URI)
//!
//! # Resolution Priority
//!
//! When multiple sources provide a tenant ID, they are resolved in this
//! priority order (highest to lowest):
//!
//! 1. Tenant header
//! 2. `tenant_id` claim
//! 3. `tid` claim
//! 4. External IdP tenant claim URI
//!
//! # Fail-closed
//!
//! There is no default-tenant fallback. A request on a non-exempt path with
//! no resolvable tenant is rejected with
//! `400 {"error": "Missing tenant identifier"}` before any handler or
//! storage code runs.

mod claims;
mod resolver;
mod source;

pub use claims::IdentityClaims;
pub use resolver::{
    ClaimTenantExtractor, HeaderTenantExtractor, ResolvedTenant, TenantResolver,
    TenantSourceExtractor,
};
pub use source::TenantSource;
