//! Error types for envelope construction, serialization and delivery

use thiserror::Error;

/// Why a single attachment was left out of an envelope.
///
/// Local to one attachment: the builder drops it and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    #[error("Invalid attachment '{filename}': {reason}")]
    Invalid { filename: String, reason: String },

    #[error("Attachment '{filename}' too large: {size} > {max} bytes")]
    TooLarge { filename: String, size: u64, max: u64 },
}

impl AttachmentError {
    pub(crate) fn invalid(filename: &str, reason: impl Into<String>) -> Self {
        AttachmentError::Invalid {
            filename: filename.to_string(),
            reason: reason.into(),
        }
    }

    /// File name of the rejected attachment.
    pub fn filename(&self) -> &str {
        match self {
            AttachmentError::Invalid { filename, .. }
            | AttachmentError::TooLarge { filename, .. } => filename,
        }
    }
}

/// Failures of the wire encoder and decoder.
///
/// On the encode side these only arise from a broken internal invariant,
/// never from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    #[error("Item {index}: header declares {declared} bytes, payload has {actual}")]
    LengthMismatch {
        index: usize,
        declared: u64,
        actual: u64,
    },

    #[error("Envelope has no items")]
    EmptyEnvelope,

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Malformed envelope: {0}")]
    Malformed(String),

    #[error("Truncated payload: expected {expected} bytes, {available} available")]
    Truncated { expected: u64, available: u64 },
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        SerializationError::Encode(err.to_string())
    }
}

/// Opaque failure reported by a destination.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Rejected by destination: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Other(String),
}

/// Outcome error for one destination of a fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The envelope never reached the destination.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// The destination was invoked and reported failure.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Invalid adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max_attachment_size must be greater than 0")]
    ZeroAttachmentSize,

    #[error("SDK name must not be empty")]
    EmptySdkName,

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
