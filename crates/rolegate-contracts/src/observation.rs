//! Decision events emitted to observation sinks.
//!
//! One `DecisionEvent` is produced per interceptor call, after the outcome is
//! known. Sinks are best-effort: nothing they do can change the outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    decision::Decision,
    rule::Rule,
    target::{InvocationId, MethodKey},
};

/// Terminal state of one pass through the interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvocationOutcome {
    /// Granted, and the guarded operation ran to completion.
    Completed,
    /// Denied; the guarded operation was never invoked.
    Rejected,
}

/// A record of one authorization decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionEvent {
    pub invocation_id: InvocationId,
    pub target: MethodKey,
    /// The resolved rule. `None` means the no-rule policy decided.
    pub rule: Option<Rule>,
    /// Name of the principal, when the context was consulted and had one.
    pub principal: Option<String>,
    pub decision: Decision,
    pub outcome: InvocationOutcome,
    /// Wall-clock time the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}
