//! # rolegate-contracts
//!
//! Shared types, declarations, and error contracts for the ROLEGATE
//! method-security core.
//!
//! Every other crate in the workspace imports from here. No decision logic
//! lives in this crate beyond validating a `Declaration` into a `Rule`.

pub mod config;
pub mod decision;
pub mod error;
pub mod observation;
pub mod principal;
pub mod rule;
pub mod target;

#[cfg(test)]
mod tests {
    use super::*;
    use config::{NoRulePolicy, SecurityConfig};
    use decision::Decision;
    use error::RolegateError;
    use principal::Principal;
    use rule::{Declaration, Rule};
    use target::{InvocationId, MethodKey};

    // ── Declaration → Rule ───────────────────────────────────────────────────

    #[test]
    fn empty_declaration_yields_no_rule() {
        let decl = Declaration::default();
        assert!(decl.is_empty());
        assert_eq!(decl.to_rule("Svc::op").unwrap(), None);
    }

    #[test]
    fn roles_allowed_becomes_require_any_role() {
        let decl = Declaration::roles_allowed(["ADMIN", "USER"]);
        assert_eq!(
            decl.to_rule("Svc::op").unwrap(),
            Some(Rule::any_of(["ADMIN", "USER"]))
        );
    }

    #[test]
    fn roles_required_becomes_require_all_roles() {
        let decl = Declaration::roles_required(["ADMIN", "AUDITOR"]);
        assert_eq!(
            decl.to_rule("Svc::op").unwrap(),
            Some(Rule::all_of(["ADMIN", "AUDITOR"]))
        );
    }

    #[test]
    fn permit_and_deny_all_convert() {
        assert_eq!(Declaration::permit_all().to_rule("T").unwrap(), Some(Rule::PermitAll));
        assert_eq!(Declaration::deny_all().to_rule("T").unwrap(), Some(Rule::DenyAll));
    }

    #[test]
    fn role_names_are_trimmed_and_deduplicated() {
        let decl = Declaration::roles_allowed([" ADMIN", "ADMIN "]);
        match decl.to_rule("Svc::op").unwrap() {
            Some(Rule::RequireAnyRole(roles)) => {
                assert_eq!(roles.len(), 1);
                assert!(roles.contains("ADMIN"));
            }
            other => panic!("expected RequireAnyRole, got {:?}", other),
        }
    }

    #[test]
    fn more_than_one_kind_is_misconfigured() {
        let decl = Declaration {
            permit_all: true,
            deny_all: true,
            ..Declaration::default()
        };

        match decl.to_rule("Svc::op") {
            Err(RolegateError::MisconfiguredRule { target, reason }) => {
                assert_eq!(target, "Svc::op");
                assert!(reason.contains("permit_all"), "unexpected reason: {reason}");
                assert!(reason.contains("deny_all"), "unexpected reason: {reason}");
            }
            other => panic!("expected MisconfiguredRule, got {:?}", other),
        }
    }

    #[test]
    fn empty_role_list_is_misconfigured() {
        let decl = Declaration::roles_allowed(Vec::<String>::new());
        match decl.to_rule("Svc") {
            Err(RolegateError::MisconfiguredRule { reason, .. }) => {
                assert!(reason.contains("at least one role"), "unexpected reason: {reason}");
            }
            other => panic!("expected MisconfiguredRule, got {:?}", other),
        }
    }

    #[test]
    fn blank_role_name_is_misconfigured() {
        let decl = Declaration::roles_required(["ADMIN", "  "]);
        assert!(matches!(
            decl.to_rule("Svc"),
            Err(RolegateError::MisconfiguredRule { .. })
        ));
    }

    // ── Rule helpers ─────────────────────────────────────────────────────────

    #[test]
    fn only_role_rules_need_a_principal() {
        assert!(Rule::any_of(["A"]).needs_principal());
        assert!(Rule::all_of(["A"]).needs_principal());
        assert!(!Rule::PermitAll.needs_principal());
        assert!(!Rule::DenyAll.needs_principal());
    }

    #[test]
    fn rule_display_lists_sorted_roles() {
        assert_eq!(
            Rule::any_of(["USER", "ADMIN"]).to_string(),
            "require-any-role[ADMIN, USER]"
        );
        assert_eq!(Rule::DenyAll.to_string(), "deny-all");
    }

    // ── MethodKey ────────────────────────────────────────────────────────────

    #[test]
    fn method_key_parses_at_last_separator() {
        let key = MethodKey::parse("bank::AccountService::withdraw").unwrap();
        assert_eq!(key.type_name, "bank::AccountService");
        assert_eq!(key.method_name, "withdraw");
        assert_eq!(key.to_string(), "bank::AccountService::withdraw");
    }

    #[test]
    fn method_key_rejects_incomplete_paths() {
        assert!(MethodKey::parse("withdraw").is_none());
        assert!(MethodKey::parse("::withdraw").is_none());
        assert!(MethodKey::parse("AccountService::").is_none());
    }

    #[test]
    fn invocation_ids_are_unique() {
        let ids: std::collections::HashSet<String> =
            (0..100).map(|_| InvocationId::new().to_string()).collect();
        assert_eq!(ids.len(), 100);
    }

    // ── Principal ────────────────────────────────────────────────────────────

    #[test]
    fn principal_authorities_are_exact_matches() {
        let mut alice = Principal::with_authorities("alice", ["ROLE_USER"]);
        assert!(alice.has_authority("ROLE_USER"));
        assert!(!alice.has_authority("USER"));

        alice.grant("ROLE_ADMIN");
        alice.grant("ROLE_ADMIN");
        assert_eq!(alice.authorities().count(), 2);
        assert_eq!(alice.name(), "alice");
    }

    // ── Config and decisions ─────────────────────────────────────────────────

    #[test]
    fn security_config_defaults() {
        let config = SecurityConfig::default();
        assert_eq!(config.role_prefix, "ROLE_");
        assert_eq!(config.default_when_no_rule, NoRulePolicy::Permit);
    }

    #[test]
    fn no_rule_policy_uses_kebab_case() {
        assert_eq!(serde_json::to_string(&NoRulePolicy::Deny).unwrap(), "\"deny\"");
        let parsed: NoRulePolicy = serde_json::from_str("\"permit\"").unwrap();
        assert_eq!(parsed, NoRulePolicy::Permit);
    }

    #[test]
    fn decision_helpers() {
        assert!(Decision::Granted.is_granted());
        let denied = Decision::denied("explicit deny");
        assert!(!denied.is_granted());
        assert_eq!(denied, Decision::Denied { reason: "explicit deny".to_string() });
    }

    // ── RolegateError display messages ───────────────────────────────────────

    #[test]
    fn error_authorization_denied_display() {
        let err = RolegateError::AuthorizationDenied {
            target: "AccountService::withdraw".to_string(),
            reason: "explicit deny".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("access denied"));
        assert!(msg.contains("AccountService::withdraw"));
        assert!(msg.contains("explicit deny"));
        assert!(err.is_access_denied());
    }

    #[test]
    fn error_authentication_missing_counts_as_denied() {
        let err = RolegateError::AuthenticationMissing {
            target: "AccountService::balance".to_string(),
        };
        assert!(err.to_string().contains("no authenticated principal"));
        assert!(err.is_access_denied());
    }

    #[test]
    fn error_misconfigured_rule_display() {
        let err = RolegateError::MisconfiguredRule {
            target: "AccountService".to_string(),
            reason: "roles_allowed must list at least one role".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("misconfigured rule"));
        assert!(msg.contains("AccountService"));
        assert!(!err.is_access_denied());
    }

    #[test]
    fn error_config_and_observation_display() {
        let config = RolegateError::ConfigError { reason: "bad toml".to_string() };
        assert!(config.to_string().contains("configuration error"));

        let observation = RolegateError::ObservationFailed { reason: "sink closed".to_string() };
        assert!(observation.to_string().contains("observation failed"));
        assert!(observation.to_string().contains("sink closed"));
    }
}
