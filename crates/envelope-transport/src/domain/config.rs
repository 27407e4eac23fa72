//! Adapter configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use envelope_transport::domain::AdapterConfig;
//!
//! let config = AdapterConfig::default()
//!     .with_max_attachment_size(5 * 1024 * 1024);
//! config.validate()?;
//! ```

use std::env;

use shared_types::SdkInfo;

use crate::error::ConfigError;

/// Default attachment cap: 20 MiB.
pub const DEFAULT_MAX_ATTACHMENT_SIZE: u64 = 20 * 1024 * 1024;

/// Options shared by every envelope the adapter builds.
///
/// Supplied at construction time and immutable for the adapter's lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Attachments larger than this many bytes are rejected whole.
    pub max_attachment_size: u64,
    /// Written into every envelope header.
    pub sdk_info: SdkInfo,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            max_attachment_size: DEFAULT_MAX_ATTACHMENT_SIZE,
            sdk_info: SdkInfo::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl AdapterConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ENVELOPE_MAX_ATTACHMENT_SIZE`: attachment cap in bytes (default: 20 MiB)
    /// - `ENVELOPE_SDK_NAME`: SDK name (default: crate name)
    /// - `ENVELOPE_SDK_VERSION`: SDK version (default: crate version)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let max_attachment_size = match env::var("ENVELOPE_MAX_ATTACHMENT_SIZE") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "ENVELOPE_MAX_ATTACHMENT_SIZE".to_string(),
                value: raw.clone(),
            })?,
            Err(_) => defaults.max_attachment_size,
        };

        let sdk_info = SdkInfo::new(
            env::var("ENVELOPE_SDK_NAME").unwrap_or(defaults.sdk_info.name),
            env::var("ENVELOPE_SDK_VERSION").unwrap_or(defaults.sdk_info.version),
        );

        let config = Self {
            max_attachment_size,
            sdk_info,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attachment_size == 0 {
            return Err(ConfigError::ZeroAttachmentSize);
        }
        if self.sdk_info.name.trim().is_empty() {
            return Err(ConfigError::EmptySdkName);
        }
        Ok(())
    }

    /// Builder-style method to set the attachment cap
    pub fn with_max_attachment_size(mut self, bytes: u64) -> Self {
        self.max_attachment_size = bytes;
        self
    }

    /// Builder-style method to set the SDK identity
    pub fn with_sdk_info(mut self, sdk_info: SdkInfo) -> Self {
        self.sdk_info = sdk_info;
        self
    }
}
