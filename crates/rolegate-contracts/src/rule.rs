//! Authorization rules and the declarations they are parsed from.
//!
//! A `Declaration` is the data form of a JSR-250 style annotation attached to
//! a type or a method. Converting it to a `Rule` validates it; once built, a
//! `Rule` is immutable and carries role names without any prefix.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RolegateError, RolegateResult};

/// The authorization requirement guarding a method.
///
/// Role names are stored bare (e.g. `"ADMIN"`). The authorization manager
/// applies its role prefix at decide-time, so a cached `Rule` stays valid when
/// the prefix is configured differently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    /// Granted when the principal holds at least one of the roles.
    RequireAnyRole(BTreeSet<String>),
    /// Granted when the principal holds every one of the roles.
    RequireAllRoles(BTreeSet<String>),
    /// Always granted.
    PermitAll,
    /// Always denied.
    DenyAll,
}

impl Rule {
    /// Build a `RequireAnyRole` rule from any iterable of role names.
    pub fn any_of<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::RequireAnyRole(roles.into_iter().map(Into::into).collect())
    }

    /// Build a `RequireAllRoles` rule from any iterable of role names.
    pub fn all_of<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::RequireAllRoles(roles.into_iter().map(Into::into).collect())
    }

    /// Short, stable name of the rule kind for logs and audit records.
    pub fn kind(&self) -> &'static str {
        match self {
            Rule::RequireAnyRole(_) => "require-any-role",
            Rule::RequireAllRoles(_) => "require-all-roles",
            Rule::PermitAll => "permit-all",
            Rule::DenyAll => "deny-all",
        }
    }

    /// Whether evaluating this rule needs the current principal.
    ///
    /// `PermitAll` and `DenyAll` are decided without looking at the caller, so
    /// the interceptor never consults the security context for them.
    pub fn needs_principal(&self) -> bool {
        matches!(self, Rule::RequireAnyRole(_) | Rule::RequireAllRoles(_))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::RequireAnyRole(roles) | Rule::RequireAllRoles(roles) => {
                let joined = roles.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
                write!(f, "{}[{}]", self.kind(), joined)
            }
            Rule::PermitAll | Rule::DenyAll => f.write_str(self.kind()),
        }
    }
}

/// An annotation-equivalent authorization declaration on a type or method.
///
/// At most one kind may be present on a single element. Example in TOML:
///
/// ```toml
/// roles_allowed = ["ADMIN", "AUDITOR"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// `RolesAllowed`: any one of these roles suffices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles_allowed: Option<Vec<String>>,

    /// Every one of these roles is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles_required: Option<Vec<String>>,

    /// `PermitAll`.
    #[serde(default)]
    pub permit_all: bool,

    /// `DenyAll`.
    #[serde(default)]
    pub deny_all: bool,
}

impl Declaration {
    pub fn roles_allowed<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles_allowed: Some(roles.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn roles_required<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles_required: Some(roles.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn permit_all() -> Self {
        Self { permit_all: true, ..Self::default() }
    }

    pub fn deny_all() -> Self {
        Self { deny_all: true, ..Self::default() }
    }

    /// True when no kind is set at all.
    pub fn is_empty(&self) -> bool {
        self.present_kinds().is_empty()
    }

    fn present_kinds(&self) -> Vec<&'static str> {
        let mut kinds = Vec::new();
        if self.roles_allowed.is_some() {
            kinds.push("roles_allowed");
        }
        if self.roles_required.is_some() {
            kinds.push("roles_required");
        }
        if self.permit_all {
            kinds.push("permit_all");
        }
        if self.deny_all {
            kinds.push("deny_all");
        }
        kinds
    }

    /// Validate this declaration and convert it into a `Rule`.
    ///
    /// `target` names the annotated element and only feeds error messages.
    /// Returns `Ok(None)` for an empty declaration.
    ///
    /// # Errors
    ///
    /// `MisconfiguredRule` when more than one kind is present, when a role
    /// list is empty, or when a role name is blank.
    pub fn to_rule(&self, target: &str) -> RolegateResult<Option<Rule>> {
        let kinds = self.present_kinds();
        if kinds.len() > 1 {
            return Err(RolegateError::MisconfiguredRule {
                target: target.to_string(),
                reason: format!(
                    "found more than one authorization declaration: {}",
                    kinds.join(", ")
                ),
            });
        }

        if let Some(roles) = &self.roles_allowed {
            return Ok(Some(Rule::RequireAnyRole(Self::validate_roles(
                target,
                "roles_allowed",
                roles,
            )?)));
        }
        if let Some(roles) = &self.roles_required {
            return Ok(Some(Rule::RequireAllRoles(Self::validate_roles(
                target,
                "roles_required",
                roles,
            )?)));
        }
        if self.permit_all {
            return Ok(Some(Rule::PermitAll));
        }
        if self.deny_all {
            return Ok(Some(Rule::DenyAll));
        }
        Ok(None)
    }

    fn validate_roles(target: &str, kind: &str, roles: &[String]) -> RolegateResult<BTreeSet<String>> {
        if roles.is_empty() {
            return Err(RolegateError::MisconfiguredRule {
                target: target.to_string(),
                reason: format!("{kind} must list at least one role"),
            });
        }
        let mut set = BTreeSet::new();
        for role in roles {
            let trimmed = role.trim();
            if trimmed.is_empty() {
                return Err(RolegateError::MisconfiguredRule {
                    target: target.to_string(),
                    reason: format!("{kind} contains a blank role name"),
                });
            }
            set.insert(trimmed.to_string());
        }
        Ok(set)
    }
}
