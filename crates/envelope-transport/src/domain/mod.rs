//! Domain Layer - Envelope assembly
//!
//! This layer contains:
//! - Attachment encoding and size limits
//! - The envelope builder and its committed item order
//! - Adapter configuration
//!
//! RULES:
//! - No network I/O (attachment files are the only thing read)
//! - No async code
//! - Time comes from the injected `TimeSource`

pub mod attachment;
pub mod builder;
pub mod config;

pub use attachment::{encode, Attachment, AttachmentSource};
pub use builder::{Assembled, EnvelopeBuilder, TRACE_CONTEXT_KEY};
pub use config::{AdapterConfig, DEFAULT_MAX_ATTACHMENT_SIZE};
