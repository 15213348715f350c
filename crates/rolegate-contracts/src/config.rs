//! Process-wide security settings.
//!
//! Settings are read once at startup (usually from the `[settings]` table of
//! a TOML declaration file) and are read-only afterwards.

use serde::{Deserialize, Serialize};

/// The prefix prepended to rule roles before they are compared with a
/// principal's authorities.
pub const DEFAULT_ROLE_PREFIX: &str = "ROLE_";

/// What the interceptor does for a method with no declaration on the method
/// or on its declaring type.
///
/// ```toml
/// default_when_no_rule = "permit"
/// default_when_no_rule = "deny"
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoRulePolicy {
    /// Run the operation unguarded, as if it were never intercepted.
    #[default]
    Permit,
    /// Reject the call with `AuthorizationDenied`.
    Deny,
}

/// Settings shared by the authorization manager and the interceptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// Prepended to every rule role at decide-time. May be empty.
    pub role_prefix: String,
    pub default_when_no_rule: NoRulePolicy,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            role_prefix: DEFAULT_ROLE_PREFIX.to_string(),
            default_when_no_rule: NoRulePolicy::default(),
        }
    }
}
