//! The ROLEGATE method interceptor.
//!
//! The interceptor enforces the method-security model on every guarded call:
//!
//!   Resolve → Principal → Decide → [operation] → Observe
//!
//! The guarded operation is invoked exactly once when the decision is
//! `Granted` and never otherwise. This is enforced structurally: the only
//! call site of `operation` is behind the granted branch of `invoke`.
//!
//! Per call the state moves `Pending → Granted → Invoking → Completed` or
//! `Pending → Denied → Rejected`. Nothing is retried and no decision is
//! reused across calls; the principal may differ from one call to the next.

use std::panic::{self, AssertUnwindSafe};

use chrono::Utc;
use tracing::{debug, warn};

use rolegate_contracts::{
    config::NoRulePolicy,
    decision::Decision,
    error::{RolegateError, RolegateResult},
    observation::{DecisionEvent, InvocationOutcome},
    principal::Principal,
    rule::Rule,
    target::{InvocationId, MethodKey},
};

use crate::traits::{AuthorizationManager, ObservationSink, RuleResolver, SecurityContext};

const NO_RULE_DENIED: &str = "no authorization rule declared and the default policy denies";
const NO_PRINCIPAL: &str = "no authenticated principal";

/// The result of the authorization half of an interception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// The rule that applied, or `None` when the no-rule policy decided.
    pub rule: Option<Rule>,
    /// Name of the principal the rule was evaluated against. Only set when
    /// the security context was consulted.
    pub principal: Option<String>,
    pub decision: Decision,
    /// True when a role rule applied and the context had no principal.
    pub principal_missing: bool,
}

/// Guards method calls with declarative authorization rules.
///
/// Holds no mutable state: one interceptor can serve any number of
/// concurrent callers.
pub struct MethodInterceptor {
    manager: Box<dyn AuthorizationManager>,
    resolver: Box<dyn RuleResolver>,
    default_when_no_rule: NoRulePolicy,
    sink: Option<Box<dyn ObservationSink>>,
}

impl MethodInterceptor {
    /// Create an interceptor without an observation sink.
    pub fn new(
        manager: Box<dyn AuthorizationManager>,
        resolver: Box<dyn RuleResolver>,
        default_when_no_rule: NoRulePolicy,
    ) -> Self {
        Self { manager, resolver, default_when_no_rule, sink: None }
    }

    /// Attach a sink that receives one `DecisionEvent` per call.
    pub fn with_observation_sink(mut self, sink: Box<dyn ObservationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn default_when_no_rule(&self) -> NoRulePolicy {
        self.default_when_no_rule
    }

    /// Resolve the rule for `target` and decide it, without running anything.
    ///
    /// The security context is consulted only for role rules; `PermitAll` and
    /// `DenyAll` are decided against an anonymous principal.
    ///
    /// # Errors
    ///
    /// Only resolution errors (`MisconfiguredRule`). A missing principal is
    /// reported through `Evaluation::principal_missing`.
    pub fn evaluate(
        &self,
        target: &MethodKey,
        security: &dyn SecurityContext,
    ) -> RolegateResult<Evaluation> {
        let rule = self.resolver.resolve(target)?;

        let Some(rule) = rule else {
            let decision = match self.default_when_no_rule {
                NoRulePolicy::Permit => Decision::Granted,
                NoRulePolicy::Deny => Decision::denied(NO_RULE_DENIED),
            };
            debug!(method = %target, decision = ?decision, "no rule declared, applying default policy");
            return Ok(Evaluation { rule: None, principal: None, decision, principal_missing: false });
        };

        if !rule.needs_principal() {
            let decision = self.manager.decide(&Principal::anonymous(), &rule);
            return Ok(Evaluation { rule: Some(rule), principal: None, decision, principal_missing: false });
        }

        match security.current_principal() {
            Some(principal) => {
                let decision = self.manager.decide(&principal, &rule);
                Ok(Evaluation {
                    rule: Some(rule),
                    principal: Some(principal.name().to_string()),
                    decision,
                    principal_missing: false,
                })
            }
            None => Ok(Evaluation {
                rule: Some(rule),
                principal: None,
                decision: Decision::denied(NO_PRINCIPAL),
                principal_missing: true,
            }),
        }
    }

    /// Authorize and, if granted, run `operation` exactly once.
    ///
    /// The operation's return value is handed back unchanged. When the
    /// operation is itself fallible its `Result` is nested inside the `Ok`,
    /// so its errors are never wrapped or masked:
    ///
    /// ```rust,ignore
    /// let outcome: Result<u64, LedgerError> =
    ///     interceptor.invoke(&key, &ctx, || ledger.withdraw(100))?;
    /// ```
    ///
    /// An operation that returns a future is returned as that future; the
    /// interceptor imposes no timeout or cancellation of its own.
    ///
    /// # Errors
    ///
    /// - `AuthorizationDenied` when the decision is `Denied`
    /// - `AuthenticationMissing` when a role rule applies and the context has
    ///   no principal
    /// - `MisconfiguredRule` from resolution
    ///
    /// In every error case `operation` has not been called.
    pub fn invoke<T, F>(
        &self,
        target: &MethodKey,
        security: &dyn SecurityContext,
        operation: F,
    ) -> RolegateResult<T>
    where
        F: FnOnce() -> T,
    {
        let invocation_id = InvocationId::new();

        debug!(invocation_id = %invocation_id, method = %target, "interception starting");

        let evaluation = self.evaluate(target, security)?;

        let denial = match &evaluation.decision {
            Decision::Granted => None,
            Decision::Denied { reason } => Some(reason.clone()),
        };

        match denial {
            None => {
                debug!(
                    invocation_id = %invocation_id,
                    method = %target,
                    rule = ?evaluation.rule.as_ref().map(Rule::kind),
                    "access granted, invoking operation"
                );

                // The only call site of the guarded operation.
                let value = operation();

                self.emit(&invocation_id, target, evaluation, InvocationOutcome::Completed);
                Ok(value)
            }

            Some(reason) => {
                let principal_missing = evaluation.principal_missing;

                warn!(
                    invocation_id = %invocation_id,
                    method = %target,
                    principal = ?evaluation.principal,
                    reason = %reason,
                    "access denied"
                );

                self.emit(&invocation_id, target, evaluation, InvocationOutcome::Rejected);

                if principal_missing {
                    Err(RolegateError::AuthenticationMissing { target: target.to_string() })
                } else {
                    Err(RolegateError::AuthorizationDenied { target: target.to_string(), reason })
                }
            }
        }
    }

    /// Hand the outcome to the sink, if any. Errors and panics stop here.
    fn emit(
        &self,
        invocation_id: &InvocationId,
        target: &MethodKey,
        evaluation: Evaluation,
        outcome: InvocationOutcome,
    ) {
        let Some(sink) = &self.sink else {
            return;
        };

        let event = DecisionEvent {
            invocation_id: invocation_id.clone(),
            target: target.clone(),
            rule: evaluation.rule,
            principal: evaluation.principal,
            decision: evaluation.decision,
            outcome,
            timestamp: Utc::now(),
        };

        match panic::catch_unwind(AssertUnwindSafe(|| sink.record(&event))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(
                invocation_id = %invocation_id,
                error = %e,
                "observation sink failed; decision unaffected"
            ),
            Err(_) => warn!(
                invocation_id = %invocation_id,
                "observation sink panicked; decision unaffected"
            ),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use rolegate_contracts::{
        config::NoRulePolicy,
        decision::Decision,
        error::{RolegateError, RolegateResult},
        observation::{DecisionEvent, InvocationOutcome},
        principal::Principal,
        rule::Rule,
        target::MethodKey,
    };

    use crate::context::StaticSecurityContext;
    use crate::traits::{AuthorizationManager, ObservationSink, RuleResolver, SecurityContext};

    use super::MethodInterceptor;

    // ── Mock helpers ─────────────────────────────────────────────────────────

    /// A manager that grants iff the principal holds the bare role name.
    struct MockManager {
        calls: Arc<Mutex<u32>>,
    }

    impl MockManager {
        fn new() -> Self {
            Self { calls: Arc::new(Mutex::new(0)) }
        }
    }

    impl AuthorizationManager for MockManager {
        fn decide(&self, principal: &Principal, rule: &Rule) -> Decision {
            *self.calls.lock().unwrap() += 1;
            match rule {
                Rule::PermitAll => Decision::Granted,
                Rule::DenyAll => Decision::denied("explicit deny"),
                Rule::RequireAnyRole(roles) | Rule::RequireAllRoles(roles) => {
                    if roles.iter().any(|r| principal.has_authority(r)) {
                        Decision::Granted
                    } else {
                        Decision::denied("missing role")
                    }
                }
            }
        }
    }

    /// A resolver backed by a fixed map.
    struct MockResolver {
        rules: HashMap<MethodKey, Rule>,
        misconfigured: bool,
    }

    impl MockResolver {
        fn with(key: &MethodKey, rule: Rule) -> Self {
            let mut rules = HashMap::new();
            rules.insert(key.clone(), rule);
            Self { rules, misconfigured: false }
        }

        fn empty() -> Self {
            Self { rules: HashMap::new(), misconfigured: false }
        }
    }

    impl RuleResolver for MockResolver {
        fn resolve(&self, target: &MethodKey) -> RolegateResult<Option<Rule>> {
            if self.misconfigured {
                return Err(RolegateError::MisconfiguredRule {
                    target: target.to_string(),
                    reason: "roles_allowed must list at least one role".to_string(),
                });
            }
            Ok(self.rules.get(target).cloned())
        }
    }

    /// A sink that records every event.
    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<DecisionEvent>>,
    }

    impl ObservationSink for RecordingSink {
        fn record(&self, event: &DecisionEvent) -> RolegateResult<()> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    /// A sink that always fails.
    struct FailingSink;

    impl ObservationSink for FailingSink {
        fn record(&self, _event: &DecisionEvent) -> RolegateResult<()> {
            Err(RolegateError::ObservationFailed { reason: "backend down".to_string() })
        }
    }

    /// A sink that panics.
    struct PanickingSink;

    impl ObservationSink for PanickingSink {
        fn record(&self, _event: &DecisionEvent) -> RolegateResult<()> {
            panic!("telemetry exploded");
        }
    }

    /// A context that counts how often it is consulted.
    struct CountingContext {
        principal: Option<Arc<Principal>>,
        lookups: Mutex<u32>,
    }

    impl SecurityContext for CountingContext {
        fn current_principal(&self) -> Option<Arc<Principal>> {
            *self.lookups.lock().unwrap() += 1;
            self.principal.clone()
        }
    }

    fn key() -> MethodKey {
        MethodKey::new("AccountService", "withdraw")
    }

    fn admin() -> StaticSecurityContext {
        StaticSecurityContext::authenticated(Principal::with_authorities("alice", ["ADMIN"]))
    }

    fn interceptor(resolver: MockResolver, policy: NoRulePolicy) -> MethodInterceptor {
        MethodInterceptor::new(Box::new(MockManager::new()), Box::new(resolver), policy)
    }

    // ── Test cases ───────────────────────────────────────────────────────────

    /// Core security test: a denial must prevent the operation from running.
    #[test]
    fn denied_call_never_runs_operation() {
        let interceptor = interceptor(MockResolver::with(&key(), Rule::DenyAll), NoRulePolicy::Permit);
        let mut calls = 0;

        let result = interceptor.invoke(&key(), &admin(), || calls += 1);

        assert_eq!(calls, 0, "operation must not run on Denied");
        match result {
            Err(RolegateError::AuthorizationDenied { target, reason }) => {
                assert_eq!(target, "AccountService::withdraw");
                assert_eq!(reason, "explicit deny");
            }
            other => panic!("expected AuthorizationDenied, got {:?}", other),
        }
    }

    #[test]
    fn granted_call_runs_operation_exactly_once() {
        let interceptor = interceptor(
            MockResolver::with(&key(), Rule::any_of(["ADMIN"])),
            NoRulePolicy::Deny,
        );
        let mut calls = 0;

        let value = interceptor
            .invoke(&key(), &admin(), || {
                calls += 1;
                42
            })
            .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(value, 42);
    }

    /// Errors of the guarded operation come back untouched inside `Ok`.
    #[test]
    fn operation_errors_pass_through_unchanged() {
        let interceptor = interceptor(MockResolver::with(&key(), Rule::PermitAll), NoRulePolicy::Deny);

        let outcome: Result<u64, String> = interceptor
            .invoke(&key(), &admin(), || Err("insufficient funds".to_string()))
            .unwrap();

        assert_eq!(outcome, Err("insufficient funds".to_string()));
    }

    #[test]
    fn no_rule_with_permit_default_runs_unguarded() {
        let interceptor = interceptor(MockResolver::empty(), NoRulePolicy::Permit);
        let ctx = StaticSecurityContext::unauthenticated();

        assert_eq!(interceptor.invoke(&key(), &ctx, || "ran").unwrap(), "ran");
    }

    #[test]
    fn no_rule_with_deny_default_is_denied() {
        let interceptor = interceptor(MockResolver::empty(), NoRulePolicy::Deny);
        let mut calls = 0;

        let result = interceptor.invoke(&key(), &admin(), || calls += 1);

        assert_eq!(calls, 0);
        match result {
            Err(RolegateError::AuthorizationDenied { reason, .. }) => {
                assert!(reason.contains("default policy denies"), "unexpected reason: {reason}");
            }
            other => panic!("expected AuthorizationDenied, got {:?}", other),
        }
    }

    #[test]
    fn role_rule_without_principal_is_authentication_missing() {
        let interceptor = interceptor(
            MockResolver::with(&key(), Rule::any_of(["ADMIN"])),
            NoRulePolicy::Permit,
        );
        let mut calls = 0;

        let result = interceptor.invoke(&key(), &StaticSecurityContext::unauthenticated(), || calls += 1);

        assert_eq!(calls, 0);
        assert!(matches!(result, Err(RolegateError::AuthenticationMissing { .. })));
    }

    /// PermitAll and DenyAll are decided without touching the context.
    #[test]
    fn permit_all_does_not_consult_context() {
        let interceptor = interceptor(MockResolver::with(&key(), Rule::PermitAll), NoRulePolicy::Deny);
        let ctx = CountingContext { principal: None, lookups: Mutex::new(0) };

        assert!(interceptor.invoke(&key(), &ctx, || ()).is_ok());
        assert_eq!(*ctx.lookups.lock().unwrap(), 0);
    }

    /// The context is consulted afresh on every call.
    #[test]
    fn principal_is_looked_up_per_invocation() {
        let interceptor = interceptor(
            MockResolver::with(&key(), Rule::any_of(["ADMIN"])),
            NoRulePolicy::Deny,
        );
        let ctx = CountingContext {
            principal: Some(Arc::new(Principal::with_authorities("alice", ["ADMIN"]))),
            lookups: Mutex::new(0),
        };

        for _ in 0..3 {
            interceptor.invoke(&key(), &ctx, || ()).unwrap();
        }
        assert_eq!(*ctx.lookups.lock().unwrap(), 3);
    }

    #[test]
    fn misconfigured_rule_surfaces_and_skips_operation() {
        let mut resolver = MockResolver::empty();
        resolver.misconfigured = true;
        let interceptor = interceptor(resolver, NoRulePolicy::Permit);
        let mut calls = 0;

        let result = interceptor.invoke(&key(), &admin(), || calls += 1);

        assert_eq!(calls, 0);
        assert!(matches!(result, Err(RolegateError::MisconfiguredRule { .. })));
    }

    #[test]
    fn sink_receives_one_event_per_call() {
        let sink = Arc::new(RecordingSink::default());
        let interceptor = MethodInterceptor::new(
            Box::new(MockManager::new()),
            Box::new(MockResolver::with(&key(), Rule::any_of(["ADMIN"]))),
            NoRulePolicy::Deny,
        )
        .with_observation_sink(Box::new(sink.clone()));

        interceptor.invoke(&key(), &admin(), || ()).unwrap();
        let bob = StaticSecurityContext::authenticated(Principal::new("bob"));
        assert!(interceptor.invoke(&key(), &bob, || ()).is_err());

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].outcome, InvocationOutcome::Completed);
        assert_eq!(events[0].decision, Decision::Granted);
        assert_eq!(events[0].principal.as_deref(), Some("alice"));
        assert_eq!(events[0].rule, Some(Rule::any_of(["ADMIN"])));

        assert_eq!(events[1].outcome, InvocationOutcome::Rejected);
        assert_eq!(events[1].principal.as_deref(), Some("bob"));
        assert_ne!(events[0].invocation_id, events[1].invocation_id);
    }

    /// A failing sink changes nothing about either outcome.
    #[test]
    fn failing_sink_is_swallowed() {
        let interceptor = interceptor(
            MockResolver::with(&key(), Rule::any_of(["ADMIN"])),
            NoRulePolicy::Deny,
        )
        .with_observation_sink(Box::new(FailingSink));

        assert_eq!(interceptor.invoke(&key(), &admin(), || 7).unwrap(), 7);

        let bob = StaticSecurityContext::authenticated(Principal::new("bob"));
        assert!(matches!(
            interceptor.invoke(&key(), &bob, || 7),
            Err(RolegateError::AuthorizationDenied { .. })
        ));
    }

    #[test]
    fn panicking_sink_is_swallowed() {
        let interceptor = interceptor(MockResolver::with(&key(), Rule::PermitAll), NoRulePolicy::Deny)
            .with_observation_sink(Box::new(PanickingSink));

        assert_eq!(interceptor.invoke(&key(), &admin(), || "done").unwrap(), "done");
    }

    #[test]
    fn evaluate_reports_without_running_anything() {
        let interceptor = interceptor(
            MockResolver::with(&key(), Rule::any_of(["ADMIN"])),
            NoRulePolicy::Deny,
        );

        let evaluation = interceptor.evaluate(&key(), &admin()).unwrap();
        assert_eq!(evaluation.decision, Decision::Granted);
        assert_eq!(evaluation.principal.as_deref(), Some("alice"));
        assert!(!evaluation.principal_missing);

        let missing = interceptor
            .evaluate(&key(), &StaticSecurityContext::unauthenticated())
            .unwrap();
        assert!(missing.principal_missing);
        assert!(!missing.decision.is_granted());
    }

    /// One interceptor serves many threads without coordination.
    #[test]
    fn concurrent_invocations_are_independent() {
        let interceptor = interceptor(
            MockResolver::with(&key(), Rule::any_of(["ADMIN"])),
            NoRulePolicy::Deny,
        );
        let runs = Mutex::new(0u32);

        std::thread::scope(|s| {
            for i in 0..8 {
                let interceptor = &interceptor;
                let runs = &runs;
                s.spawn(move || {
                    let ctx = if i % 2 == 0 {
                        admin()
                    } else {
                        StaticSecurityContext::authenticated(Principal::new("guest"))
                    };
                    for _ in 0..50 {
                        let _ = interceptor.invoke(&key(), &ctx, || *runs.lock().unwrap() += 1);
                    }
                });
            }
        });

        // Only the four admin threads get through.
        assert_eq!(*runs.lock().unwrap(), 4 * 50);
    }
}
