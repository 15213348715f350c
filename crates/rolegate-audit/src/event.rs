//! Chained audit entries and exported logs.
//!
//! `AuditEvent` wraps one `DecisionEvent` with its position in the chain and
//! the SHA-256 hashes that make tampering detectable. `AuditLog` is the
//! snapshot produced by `InMemoryDecisionLog::export_log`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rolegate_contracts::observation::DecisionEvent;

/// A single entry in the SHA-256 hash chain of one decision log.
///
/// Modifying any field, including those of the embedded `record`,
/// invalidates `this_hash` and every later `prev_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Position in the chain, starting at 0.
    pub sequence: u64,

    /// The log this event belongs to.
    pub log_id: String,

    /// The decision event as emitted by the interceptor.
    pub record: DecisionEvent,

    /// Hash (hex) of the previous event, or `GENESIS_HASH` for the first.
    pub prev_hash: String,

    /// Hash (hex) over (log_id, sequence, prev_hash, canonical JSON of record).
    pub this_hash: String,
}

impl AuditEvent {
    /// The `prev_hash` of the first event in every chain: 64 hex zeros.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// A snapshot of a decision log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub log_id: String,

    /// All events in chain order.
    pub events: Vec<AuditEvent>,

    /// Wall-clock time (UTC) of the export.
    pub exported_at: DateTime<Utc>,

    /// The `this_hash` of the last event, or an empty string for an empty log.
    pub terminal_hash: String,
}
