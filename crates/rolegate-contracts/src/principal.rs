//! The authenticated caller as seen by the authorization core.
//!
//! Principals are produced by the hosting application's authentication layer
//! and handed to the core through a security context. The core only reads
//! them; it never constructs or stores one on its own.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// An authenticated identity together with its granted authorities.
///
/// Authorities are compared verbatim, so role authorities must already carry
/// the configured role prefix (e.g. `"ROLE_ADMIN"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    name: String,
    authorities: HashSet<String>,
}

impl Principal {
    /// Create a principal with no authorities.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            authorities: HashSet::new(),
        }
    }

    /// Create a principal holding the given authorities.
    pub fn with_authorities<I, S>(name: impl Into<String>, authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            authorities: authorities.into_iter().map(Into::into).collect(),
        }
    }

    /// The principal used to evaluate `PermitAll` and `DenyAll` when the
    /// security context is not consulted. Holds no authorities.
    pub fn anonymous() -> Self {
        Self::new("anonymous")
    }

    /// Grant one more authority. Granting twice is a no-op.
    pub fn grant(&mut self, authority: impl Into<String>) {
        self.authorities.insert(authority.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return true if the principal holds `authority` exactly.
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }

    /// Return an iterator over all granted authorities.
    pub fn authorities(&self) -> impl Iterator<Item = &str> {
        self.authorities.iter().map(String::as_str)
    }
}
