//! Error types for the ROLEGATE authorization pipeline.
//!
//! All fallible operations return `RolegateResult<T>`. Errors raised by a
//! guarded operation itself never pass through this type: the interceptor
//! hands them back to the caller untouched.

use thiserror::Error;

/// The unified error type for the ROLEGATE crates.
#[derive(Debug, Error)]
pub enum RolegateError {
    /// The authorization manager denied the call. The guarded operation was
    /// never invoked.
    #[error("access denied to '{target}': {reason}")]
    AuthorizationDenied { target: String, reason: String },

    /// A role-based rule applies but the security context holds no principal.
    #[error("no authenticated principal available for '{target}'")]
    AuthenticationMissing { target: String },

    /// A declaration cannot be turned into a rule.
    ///
    /// Raised while loading or preloading declarations, never deferred to the
    /// first guarded call.
    #[error("misconfigured rule on '{target}': {reason}")]
    MisconfiguredRule { target: String, reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// An observation sink could not record a decision event.
    ///
    /// The interceptor swallows this; it is only visible to direct callers
    /// of a sink.
    #[error("observation failed: {reason}")]
    ObservationFailed { reason: String },
}

impl RolegateError {
    /// True for the errors a caller should present as "access denied".
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            RolegateError::AuthorizationDenied { .. } | RolegateError::AuthenticationMissing { .. }
        )
    }
}

/// Convenience alias used throughout the ROLEGATE crates.
pub type RolegateResult<T> = Result<T, RolegateError>;
