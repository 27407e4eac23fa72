//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - API for SDK callers
//! - Driven Ports (outbound) - Destinations and the clock

pub mod inbound;
pub mod outbound;

pub use inbound::{DestinationOutcome, DispatchReport, Operation, TransportAdapterApi};
pub use outbound::{TimeSource, Transport};
