//! Non-blocking observation through a bounded buffer.
//!
//! `BufferedSink` hands events to a recorder thread over a bounded channel.
//! `record` never waits: when the buffer is full the event is dropped and
//! counted, so a slow sink cannot stall authorization.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use rolegate_contracts::{
    error::{RolegateError, RolegateResult},
    observation::DecisionEvent,
};
use rolegate_core::traits::ObservationSink;

/// Wraps any sink so that recording is fire-and-forget.
pub struct BufferedSink {
    sender: Option<SyncSender<DecisionEvent>>,
    worker: Option<JoinHandle<()>>,
    dropped: Arc<AtomicU64>,
}

impl BufferedSink {
    /// Start a recorder thread feeding `inner` from a buffer of `capacity`
    /// events.
    pub fn spawn(inner: Box<dyn ObservationSink>, capacity: usize) -> RolegateResult<Self> {
        if capacity == 0 {
            return Err(RolegateError::ConfigError {
                reason: "observation buffer capacity must be at least 1".to_string(),
            });
        }

        let (sender, receiver) = mpsc::sync_channel::<DecisionEvent>(capacity);
        let worker = thread::Builder::new()
            .name("rolegate-recorder".to_string())
            .spawn(move || {
                for event in receiver {
                    if let Err(e) = inner.record(&event) {
                        warn!(method = %event.target, error = %e, "buffered observation failed");
                    }
                }
            })
            .map_err(|e| RolegateError::ConfigError {
                reason: format!("failed to start observation recorder: {}", e),
            })?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            dropped: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Number of events discarded because the buffer was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop accepting events and wait until everything buffered is recorded.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        drop(self.sender.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("observation recorder thread panicked");
            }
            let dropped = self.dropped();
            if dropped > 0 {
                info!(dropped, "observation buffer closed with dropped events");
            }
        }
    }
}

impl ObservationSink for BufferedSink {
    fn record(&self, event: &DecisionEvent) -> RolegateResult<()> {
        let Some(sender) = &self.sender else {
            return Err(RolegateError::ObservationFailed {
                reason: "observation buffer is closed".to_string(),
            });
        };

        match sender.try_send(event.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(RolegateError::ObservationFailed {
                    reason: "observation buffer full, event dropped".to_string(),
                })
            }
            Err(TrySendError::Disconnected(_)) => Err(RolegateError::ObservationFailed {
                reason: "observation recorder stopped".to_string(),
            }),
        }
    }
}

impl Drop for BufferedSink {
    fn drop(&mut self) {
        self.close();
    }
}
