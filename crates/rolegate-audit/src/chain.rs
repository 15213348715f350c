//! Hash-chain primitives.
//!
//! Hash input layout (bytes, in order):
//!   1. log_id as UTF-8 bytes
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. canonical JSON of the decision event (compact serde_json)

use sha2::{Digest, Sha256};

use rolegate_contracts::{
    error::{RolegateError, RolegateResult},
    observation::DecisionEvent,
};

use crate::event::AuditEvent;

/// Compute the SHA-256 hash of one chain entry as lowercase hex.
pub fn hash_event(
    log_id: &str,
    sequence: u64,
    record: &DecisionEvent,
    prev_hash: &str,
) -> RolegateResult<String> {
    let record_json = serde_json::to_vec(record).map_err(|e| RolegateError::ObservationFailed {
        reason: format!("decision event could not be serialized: {}", e),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(log_id.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&record_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Verify the integrity of a hash chain.
///
/// Valid when every event links to its predecessor (or `GENESIS_HASH`), its
/// sequence matches its position, and its `this_hash` recomputes. An empty
/// chain is valid.
pub fn verify_chain(events: &[AuditEvent]) -> bool {
    let mut expected_prev = AuditEvent::GENESIS_HASH.to_string();

    for (position, event) in events.iter().enumerate() {
        if event.prev_hash != expected_prev || event.sequence != position as u64 {
            return false;
        }

        match hash_event(&event.log_id, event.sequence, &event.record, &event.prev_hash) {
            Ok(recomputed) if recomputed == event.this_hash => {}
            _ => return false,
        }

        expected_prev = event.this_hash.clone();
    }

    true
}
