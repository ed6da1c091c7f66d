//! Identity claims carried in request extensions.
//!
//! The authentication layer (out of scope here) verifies the caller's token
//! and inserts an [`IdentityClaims`] extension. Tenant resolution consumes
//! it read-only as a fallback when no tenant header is present.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Verified identity claims for the current request.
///
/// Keys are claim names as issued by the identity provider (e.g.
/// `tenant_id`, `tid`, or a full claim URI).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityClaims(HashMap<String, String>);

impl IdentityClaims {
    /// Creates an empty claim set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the claim value for the given name, if present and non-empty.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Adds a claim, replacing any existing value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder-style form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Returns true if no claims are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for IdentityClaims {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
