//! Outbound Ports (Driven Ports)
//!
//! Capabilities the adapter requires from the host application: delivery
//! destinations and a clock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::Envelope;

use crate::error::TransportError;

/// A delivery or persistence destination (Driven Port).
///
/// Production: an HTTP transport, a disk queue, an in-process relay.
/// Testing: `InMemoryTransport` (adapters/in_memory.rs)
///
/// Implementations own their retries, rate limiting and timeouts. The
/// envelope is shared read-only between all destinations of a fan-out.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver an envelope now.
    async fn send(&self, envelope: &Envelope) -> Result<(), TransportError>;

    /// Persist an envelope for later delivery.
    async fn store(&self, envelope: &Envelope) -> Result<(), TransportError>;

    /// Label used in logs and dispatch reports.
    fn name(&self) -> &str {
        "transport"
    }
}

/// Abstract interface for time operations (for testability).
///
/// The envelope builder never reads ambient time; default timestamps come
/// from this source.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
