//! # rolegate-audit
//!
//! Observation sinks for the ROLEGATE interceptor.
//!
//! ## Overview
//!
//! `InMemoryDecisionLog` keeps every `DecisionEvent` in an append-only
//! SHA-256 hash chain; tampering with any stored event is detected by
//! `verify_chain`. `BufferedSink` puts a bounded buffer and a recorder thread
//! in front of any sink so that emission never blocks a guarded call.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rolegate_audit::{BufferedSink, InMemoryDecisionLog};
//!
//! let log = Arc::new(InMemoryDecisionLog::new("accounts"));
//! let sink = BufferedSink::spawn(Box::new(log.clone()), 1024)?;
//! let interceptor = jsr250_interceptor(&settings, source, Some(Box::new(sink)))?;
//! ```

pub mod buffered;
pub mod chain;
pub mod event;
pub mod memory;

pub use buffered::BufferedSink;
pub use chain::{hash_event, verify_chain};
pub use event::{AuditEvent, AuditLog};
pub use memory::InMemoryDecisionLog;

// ── Tests ─────────────────────────────────────────────────────────────────────
