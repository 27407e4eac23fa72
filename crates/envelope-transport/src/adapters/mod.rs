//! Adapters Layer (Driven Adapters)
//!
//! ## Adapters
//!
//! - `InMemoryTransport` - Records envelopes, optionally failing on demand
//! - `SystemTimeSource` / `FixedTimeSource` - Clocks for the builder

pub mod in_memory;
pub mod time;

pub use in_memory::InMemoryTransport;
pub use time::{FixedTimeSource, SystemTimeSource};
