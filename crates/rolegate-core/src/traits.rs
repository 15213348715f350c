//! Core trait definitions for the ROLEGATE interception pipeline.
//!
//! These traits are the complete set of seams between the core and its
//! collaborators:
//!
//! - `AuthorizationManager` — trusted decision function (rule + principal)
//! - `RuleResolver`         — finds the rule guarding a method
//! - `DeclarationSource`    — load-time-immutable annotation data
//! - `SecurityContext`      — supplies the current principal
//! - `ObservationSink`      — best-effort recipient of decision events
//!
//! `MethodInterceptor` wires them together. A guarded operation is never run
//! unless the manager first returns `Decision::Granted` (or no rule applies
//! and the no-rule policy permits).

use std::sync::Arc;

use rolegate_contracts::{
    decision::Decision,
    error::RolegateResult,
    observation::DecisionEvent,
    principal::Principal,
    rule::{Declaration, Rule},
    target::MethodKey,
};

/// Evaluates a rule against a principal.
///
/// Implementations must be pure functions of the principal, the rule, and
/// their own startup configuration (e.g. the role prefix). They sit on the
/// hot path of every guarded call: no I/O, no blocking.
pub trait AuthorizationManager: Send + Sync {
    fn decide(&self, principal: &Principal, rule: &Rule) -> Decision;
}

/// Locates the rule that applies to a guarded method.
///
/// Repeated calls for the same key must return the same answer for the
/// lifetime of the process.
pub trait RuleResolver: Send + Sync {
    /// Return the applicable rule, or `None` when nothing is declared.
    ///
    /// Returns `MisconfiguredRule` when the applicable declaration is invalid.
    fn resolve(&self, target: &MethodKey) -> RolegateResult<Option<Rule>>;
}

impl<T: RuleResolver + ?Sized> RuleResolver for Arc<T> {
    fn resolve(&self, target: &MethodKey) -> RolegateResult<Option<Rule>> {
        (**self).resolve(target)
    }
}

/// Supplies annotation-equivalent declarations for types and methods.
///
/// Declarations are fixed once the source is built; the resolver relies on
/// this when it memoizes.
pub trait DeclarationSource: Send + Sync {
    /// The declaration attached to the type itself, if any.
    fn type_declaration(&self, type_name: &str) -> Option<&Declaration>;

    /// The declaration attached directly to the method, if any.
    fn method_declaration(&self, target: &MethodKey) -> Option<&Declaration>;

    /// Every method the source declares something for.
    fn targets(&self) -> Vec<MethodKey>;
}

/// Supplies the principal of the current invocation.
///
/// Passed explicitly into `MethodInterceptor::invoke`. Implementations may be
/// backed by thread-local or task-local storage, but a lookup must never
/// wait.
pub trait SecurityContext {
    /// The authenticated caller, or `None` when nobody is authenticated.
    fn current_principal(&self) -> Option<Arc<Principal>>;
}

/// Receives one `DecisionEvent` per interceptor call.
///
/// The interceptor treats sinks as fire-and-forget: an `Err` or a panic from
/// `record` is logged and discarded, never surfaced to the caller.
pub trait ObservationSink: Send + Sync {
    fn record(&self, event: &DecisionEvent) -> RolegateResult<()>;
}

impl<T: ObservationSink + ?Sized> ObservationSink for Arc<T> {
    fn record(&self, event: &DecisionEvent) -> RolegateResult<()> {
        (**self).record(event)
    }
}
