//! In-memory, hash-chained decision log.
//!
//! `InMemoryDecisionLog` implements `ObservationSink`. Appends take a short
//! mutex-guarded critical section: hash one event, push it. Wrap it in a
//! `BufferedSink` when the interceptor must never wait on the log at all.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::debug;

use rolegate_contracts::{
    error::{RolegateError, RolegateResult},
    observation::DecisionEvent,
};
use rolegate_core::traits::ObservationSink;

use crate::{
    chain::{hash_event, verify_chain},
    event::{AuditEvent, AuditLog},
};

pub(crate) struct LogState {
    pub(crate) events: Vec<AuditEvent>,
    /// Next sequence number to assign.
    pub(crate) sequence: u64,
    /// `this_hash` of the last event, or `GENESIS_HASH`.
    pub(crate) last_hash: String,
}

/// An append-only decision log backed by a SHA-256 hash chain.
pub struct InMemoryDecisionLog {
    log_id: String,
    pub(crate) state: Mutex<LogState>,
}

impl InMemoryDecisionLog {
    pub fn new(log_id: impl Into<String>) -> Self {
        Self {
            log_id: log_id.into(),
            state: Mutex::new(LogState {
                events: Vec::new(),
                sequence: 0,
                last_hash: AuditEvent::GENESIS_HASH.to_string(),
            }),
        }
    }

    pub fn log_id(&self) -> &str {
        &self.log_id
    }

    fn lock(&self) -> RolegateResult<MutexGuard<'_, LogState>> {
        self.state.lock().map_err(|e| RolegateError::ObservationFailed {
            reason: format!("decision log lock poisoned: {}", e),
        })
    }

    /// Number of recorded events. A poisoned log is an error, not empty.
    pub fn len(&self) -> RolegateResult<usize> {
        Ok(self.lock()?.events.len())
    }

    pub fn is_empty(&self) -> RolegateResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Snapshot every event written so far.
    pub fn export_log(&self) -> RolegateResult<AuditLog> {
        let state = self.lock()?;

        Ok(AuditLog {
            log_id: self.log_id.clone(),
            events: state.events.clone(),
            exported_at: Utc::now(),
            terminal_hash: state.events.last().map(|e| e.this_hash.clone()).unwrap_or_default(),
        })
    }

    /// True while the in-memory chain is untampered. A poisoned log is
    /// reported as not intact.
    pub fn verify_integrity(&self) -> bool {
        self.state
            .lock()
            .map(|state| verify_chain(&state.events))
            .unwrap_or(false)
    }
}

impl ObservationSink for InMemoryDecisionLog {
    fn record(&self, event: &DecisionEvent) -> RolegateResult<()> {
        let mut state = self.lock()?;

        let prev_hash = state.last_hash.clone();
        let sequence = state.sequence;
        let this_hash = hash_event(&self.log_id, sequence, event, &prev_hash)?;

        state.events.push(AuditEvent {
            sequence,
            log_id: self.log_id.clone(),
            record: event.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.sequence += 1;
        state.last_hash = this_hash;

        debug!(log_id = %self.log_id, sequence, method = %event.target, "decision recorded");

        Ok(())
    }
}
