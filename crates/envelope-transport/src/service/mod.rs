//! Service Layer
//!
//! Orchestrates envelope assembly and destination fan-out.

pub mod transport_adapter;

pub use transport_adapter::TransportAdapter;
