//! JSR-250 authorization manager.
//!
//! Decision table (`P` = role prefix, `A` = principal authorities):
//!
//! | rule                   | granted when                 |
//! |------------------------|------------------------------|
//! | `PermitAll`            | always                       |
//! | `DenyAll`              | never                        |
//! | `RequireAnyRole(R)`    | `{P+r : r ∈ R} ∩ A ≠ ∅`      |
//! | `RequireAllRoles(R)`   | `{P+r : r ∈ R} ⊆ A`          |
//!
//! An empty `RequireAnyRole` is denied and an empty `RequireAllRoles` is
//! granted. The prefix is applied here, at decide-time, and never stored in
//! a `Rule`.

use tracing::debug;

use rolegate_contracts::{
    config::{SecurityConfig, DEFAULT_ROLE_PREFIX},
    decision::Decision,
    principal::Principal,
    rule::Rule,
};
use rolegate_core::traits::AuthorizationManager;

/// Decides JSR-250 rules against a principal's granted authorities.
#[derive(Debug, Clone)]
pub struct Jsr250AuthorizationManager {
    role_prefix: String,
}

impl Jsr250AuthorizationManager {
    /// A manager using the default `"ROLE_"` prefix.
    pub fn new() -> Self {
        Self::with_role_prefix(DEFAULT_ROLE_PREFIX)
    }

    /// A manager using `role_prefix`. An empty prefix compares bare names.
    pub fn with_role_prefix(role_prefix: impl Into<String>) -> Self {
        Self { role_prefix: role_prefix.into() }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::with_role_prefix(config.role_prefix.as_str())
    }

    pub fn role_prefix(&self) -> &str {
        &self.role_prefix
    }

    fn authority_for(&self, role: &str) -> String {
        format!("{}{}", self.role_prefix, role)
    }
}

impl Default for Jsr250AuthorizationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorizationManager for Jsr250AuthorizationManager {
    fn decide(&self, principal: &Principal, rule: &Rule) -> Decision {
        let decision = match rule {
            Rule::PermitAll => Decision::Granted,

            Rule::DenyAll => Decision::denied("explicit deny"),

            Rule::RequireAnyRole(roles) => {
                let required: Vec<String> = roles.iter().map(|r| self.authority_for(r)).collect();
                if required.iter().any(|a| principal.has_authority(a)) {
                    Decision::Granted
                } else if required.is_empty() {
                    Decision::denied("missing any of roles: none declared")
                } else {
                    Decision::denied(format!("missing any of roles: {}", required.join(", ")))
                }
            }

            Rule::RequireAllRoles(roles) => {
                let missing: Vec<String> = roles
                    .iter()
                    .map(|r| self.authority_for(r))
                    .filter(|a| !principal.has_authority(a))
                    .collect();
                if missing.is_empty() {
                    Decision::Granted
                } else {
                    Decision::denied(format!("missing required role: {}", missing.join(", ")))
                }
            }
        };

        debug!(
            principal = %principal.name(),
            rule = %rule,
            granted = decision.is_granted(),
            "rule decided"
        );

        decision
    }
}
