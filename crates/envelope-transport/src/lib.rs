//! # Envelope Transport
//!
//! Packages SDK telemetry into envelopes and fans each envelope out to every
//! configured destination.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure assembly, no network I/O
//!   - `EnvelopeBuilder`: Builds one envelope per request in committed order
//!   - `Attachment` / `encode`: Turns files and buffers into attachment items
//!   - `AdapterConfig`: Size cap and SDK identity, with validation
//!
//! - **Codec Layer** (`codec/`): Byte-exact wire format
//!   - `serialize` / `deserialize` / `write_envelope`
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `TransportAdapterApi`: Driving port (inbound API)
//!   - `Transport`, `TimeSource`: Driven ports
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `TransportAdapter`: Implements `TransportAdapterApi`
//!
//! - **Adapters Layer** (`adapters/`): `InMemoryTransport` and clocks
//!
//! ## Invariants
//!
//! - One call builds exactly one envelope; every destination receives it
//!   exactly once.
//! - A failing destination never prevents delivery to the others.
//! - A rejected attachment never produces an item and never aborts the
//!   envelope.
//! - Equal inputs with an equal clock serialize to identical bytes.
//!
//! ## Usage Example
//!
//! ```ignore
//! use envelope_transport::{
//!     AdapterConfig, InMemoryTransport, TransportAdapter, TransportAdapterApi,
//! };
//! use shared_types::{Event, EventId};
//! use std::sync::Arc;
//!
//! let primary = Arc::new(InMemoryTransport::new("primary"));
//! let adapter = TransportAdapter::new(vec![primary.clone()], AdapterConfig::from_env()?)?;
//!
//! let report = adapter
//!     .send_event_with_trace_context(&Event::new(EventId::new()), None, &[])
//!     .await;
//! assert!(report.all_accepted());
//! ```

pub mod adapters;
pub mod codec;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use adapters::{FixedTimeSource, InMemoryTransport, SystemTimeSource};
pub use codec::{deserialize, serialize, verify, write_envelope};
pub use domain::{
    AdapterConfig, Assembled, Attachment, AttachmentSource, EnvelopeBuilder,
    DEFAULT_MAX_ATTACHMENT_SIZE, TRACE_CONTEXT_KEY,
};
pub use error::{AttachmentError, ConfigError, DeliveryError, SerializationError, TransportError};
pub use metrics::{AdapterMetrics, MetricsSnapshot};
pub use ports::{
    DestinationOutcome, DispatchReport, Operation, TimeSource, Transport, TransportAdapterApi,
};
pub use service::TransportAdapter;
