//! # rolegate-policy
//!
//! JSR-250 style method authorization for the ROLEGATE core.
//!
//! ## Overview
//!
//! - [`Jsr250AuthorizationManager`] decides `RolesAllowed` / `PermitAll` /
//!   `DenyAll` rules against a principal, applying the role prefix.
//! - [`DeclarationTable`] holds type- and method-level declarations, built in
//!   code or loaded with [`SecurityPolicy`] from TOML.
//! - [`AnnotationResolver`] finds the most specific declaration for a method
//!   and memoizes the result.
//! - [`jsr250_interceptor`] wires the three into a ready `MethodInterceptor`.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use rolegate_policy::{jsr250_interceptor, SecurityPolicy};
//!
//! let policy = SecurityPolicy::from_file(Path::new("policies/accounts.toml"))?;
//! let interceptor = jsr250_interceptor(&policy.settings, Box::new(policy.declarations), None)?;
//! ```

pub mod declarations;
pub mod manager;
pub mod resolver;

pub use declarations::{DeclarationTable, SecurityPolicy};
pub use manager::Jsr250AuthorizationManager;
pub use resolver::{resolve_declarations, AnnotationResolver};

use tracing::info;

use rolegate_contracts::{config::SecurityConfig, error::RolegateResult};
use rolegate_core::{
    traits::{DeclarationSource, ObservationSink},
    MethodInterceptor,
};

/// Assemble a JSR-250 interceptor from settings, declarations, and an
/// optional observation sink.
///
/// The resolver is preloaded before the interceptor is returned, so a
/// misconfigured declaration fails here instead of at the first guarded
/// call. Without a sink, observation is a no-op.
pub fn jsr250_interceptor(
    settings: &SecurityConfig,
    source: Box<dyn DeclarationSource>,
    sink: Option<Box<dyn ObservationSink>>,
) -> RolegateResult<MethodInterceptor> {
    let resolver = AnnotationResolver::new(source);
    let guarded = resolver.preload()?;

    let interceptor = MethodInterceptor::new(
        Box::new(Jsr250AuthorizationManager::from_config(settings)),
        Box::new(resolver),
        settings.default_when_no_rule,
    );

    info!(
        guarded,
        role_prefix = %settings.role_prefix,
        default_when_no_rule = ?settings.default_when_no_rule,
        observed = sink.is_some(),
        "jsr-250 interceptor ready"
    );

    Ok(match sink {
        Some(sink) => interceptor.with_observation_sink(sink),
        None => interceptor,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
