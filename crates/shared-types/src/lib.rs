//! # Shared Types Crate
//!
//! This crate contains the domain value objects the SDK packages and the
//! envelope wire model every delivery destination receives.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: events, sessions, feedback, trace context and
//!   the envelope/item model are defined here and nowhere else.
//! - **Deterministic Encoding**: struct field order is the wire key order and
//!   all maps are ordered, so equal values always encode to equal bytes.
//! - **Caller Ownership**: the core only reads domain objects and copies the
//!   bytes it needs into item payloads.

pub mod entities;
pub mod envelope;
pub mod errors;

pub use entities::*;
pub use envelope::{
    Envelope, EnvelopeHeader, Item, ItemHeader, ItemType, CONTENT_TYPE_JSON,
    CONTENT_TYPE_OCTET_STREAM,
};
pub use errors::*;
