//! Codec Layer
//!
//! Byte-level envelope format shared by every destination.

pub mod serializer;

pub use serializer::{deserialize, serialize, verify, write_envelope};
