//! Annotation resolution with per-method memoization.
//!
//! Precedence, most specific first:
//!
//! 1. a declaration on the method itself
//! 2. a declaration on the method's declaring type
//! 3. nothing
//!
//! A method declaration replaces the type declaration outright; the two are
//! never merged. Results are memoized in a sharded concurrent map, and a key
//! is computed at most once even under concurrent first access.

use dashmap::DashMap;
use tracing::{debug, info};

use rolegate_contracts::{
    error::RolegateResult,
    rule::{Declaration, Rule},
    target::MethodKey,
};
use rolegate_core::traits::{DeclarationSource, RuleResolver};

/// Pick the applicable rule from a type declaration and a method declaration.
///
/// A present but empty method declaration does not shadow the type.
///
/// # Errors
///
/// `MisconfiguredRule` if the winning declaration is invalid.
pub fn resolve_declarations(
    target: &MethodKey,
    type_declaration: Option<&Declaration>,
    method_declaration: Option<&Declaration>,
) -> RolegateResult<Option<Rule>> {
    if let Some(rule) = method_declaration
        .map(|d| d.to_rule(&target.to_string()))
        .transpose()?
        .flatten()
    {
        return Ok(Some(rule));
    }

    type_declaration
        .map(|d| d.to_rule(&target.type_name))
        .transpose()
        .map(Option::flatten)
}

/// A `RuleResolver` over a `DeclarationSource`, memoizing per `MethodKey`.
///
/// The cache stores bare rules; the role prefix is applied later by the
/// authorization manager, so one resolver can back managers configured with
/// different prefixes.
pub struct AnnotationResolver {
    source: Box<dyn DeclarationSource>,
    cache: DashMap<MethodKey, Option<Rule>>,
}

impl AnnotationResolver {
    pub fn new(source: Box<dyn DeclarationSource>) -> Self {
        Self { source, cache: DashMap::new() }
    }

    /// Resolve every target the source knows, filling the cache.
    ///
    /// Call at startup so that a misconfigured declaration fails the boot
    /// rather than the first guarded call. Returns how many targets resolved
    /// to a rule.
    pub fn preload(&self) -> RolegateResult<usize> {
        let mut guarded = 0;
        let targets = self.source.targets();
        for target in &targets {
            if self.resolve(target)?.is_some() {
                guarded += 1;
            }
        }
        info!(targets = targets.len(), guarded, "rule resolver preloaded");
        Ok(guarded)
    }

    /// Number of memoized keys.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn compute(&self, target: &MethodKey) -> RolegateResult<Option<Rule>> {
        let rule = resolve_declarations(
            target,
            self.source.type_declaration(&target.type_name),
            self.source.method_declaration(target),
        )?;
        debug!(
            method = %target,
            rule = ?rule.as_ref().map(Rule::kind),
            "rule resolved"
        );
        Ok(rule)
    }
}

impl RuleResolver for AnnotationResolver {
    fn resolve(&self, target: &MethodKey) -> RolegateResult<Option<Rule>> {
        if let Some(hit) = self.cache.get(target) {
            return Ok(hit.value().clone());
        }

        // The entry holds the shard lock while computing, so racing callers
        // for the same key wait here and then read the stored value.
        let entry = self
            .cache
            .entry(target.clone())
            .or_try_insert_with(|| self.compute(target))?;
        Ok(entry.value().clone())
    }
}
