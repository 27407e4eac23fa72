//! Counters for adapter activity
//!
//! Thread-safe counters shared by every call on one adapter. They are the
//! only state an adapter mutates, and nothing reads them back while
//! building or dispatching envelopes.
//!
//! ## Usage
//!
//! ```ignore
//! let report = adapter.send_user_feedback(&feedback).await;
//! let snapshot = adapter.metrics().snapshot();
//! assert_eq!(snapshot.envelopes_sent, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use crate::ports::inbound::Operation;

/// Metrics collector for fan-out operations
#[derive(Debug, Default)]
pub struct AdapterMetrics {
    /// Envelopes fanned out with `send`
    pub envelopes_sent: AtomicU64,
    /// Envelopes fanned out with `store`
    pub envelopes_stored: AtomicU64,
    /// Envelopes that failed validation and reached no destination
    pub envelopes_rejected: AtomicU64,
    /// Individual destination invocations
    pub destination_calls: AtomicU64,
    /// Destination invocations that reported failure
    pub destination_failures: AtomicU64,
    /// Attachments left out by the encoder
    pub attachments_dropped: AtomicU64,
}

impl AdapterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_dispatch(&self, operation: Operation) {
        let counter = match operation {
            Operation::Send => &self.envelopes_sent,
            Operation::Store => &self.envelopes_stored,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.envelopes_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the result of one destination invocation
    pub fn record_destination(&self, ok: bool) {
        self.destination_calls.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.destination_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_attachments_dropped(&self, count: usize) {
        if count > 0 {
            self.attachments_dropped
                .fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            envelopes_sent: self.envelopes_sent.load(Ordering::Relaxed),
            envelopes_stored: self.envelopes_stored.load(Ordering::Relaxed),
            envelopes_rejected: self.envelopes_rejected.load(Ordering::Relaxed),
            destination_calls: self.destination_calls.load(Ordering::Relaxed),
            destination_failures: self.destination_failures.load(Ordering::Relaxed),
            attachments_dropped: self.attachments_dropped.load(Ordering::Relaxed),
        }
    }

    /// Fraction of destination invocations that failed
    pub fn failure_rate(&self) -> f64 {
        let calls = self.destination_calls.load(Ordering::Relaxed);
        let failures = self.destination_failures.load(Ordering::Relaxed);
        if calls > 0 {
            failures as f64 / calls as f64
        } else {
            0.0
        }
    }
}

/// Point-in-time copy of [`AdapterMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub envelopes_sent: u64,
    pub envelopes_stored: u64,
    pub envelopes_rejected: u64,
    pub destination_calls: u64,
    pub destination_failures: u64,
    pub attachments_dropped: u64,
}
