//! Authorization decisions.

use serde::{Deserialize, Serialize};

/// The outcome of evaluating a rule against a principal.
///
/// Only `Granted` lets the interceptor invoke the guarded operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Granted,
    Denied {
        /// Human-readable explanation, surfaced in `AuthorizationDenied`.
        reason: String,
    },
}

impl Decision {
    pub fn denied(reason: impl Into<String>) -> Self {
        Decision::Denied { reason: reason.into() }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Decision::Granted)
    }
}
