//! Clock adapters for the `TimeSource` port
//!
//! `SystemTimeSource` for production, `FixedTimeSource` for reproducible
//! envelopes in tests.

use chrono::{DateTime, Utc};

use crate::ports::outbound::TimeSource;

/// Default time source using system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A time source that always returns the same instant.
///
/// # Example
///
/// ```ignore
/// let time = FixedTimeSource::from_unix(1_700_000_000);
/// assert_eq!(time.now().timestamp(), 1_700_000_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTimeSource {
    instant: DateTime<Utc>,
}

impl FixedTimeSource {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }

    /// Fixed at `secs` seconds after the Unix epoch; out-of-range values
    /// clamp to the epoch.
    pub fn from_unix(secs: i64) -> Self {
        Self::new(DateTime::from_timestamp(secs, 0).unwrap_or_default())
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_time_source_returns_configured_value() {
        let source = FixedTimeSource::from_unix(1000);
        assert_eq!(source.now().timestamp(), 1000);
    }

    #[test]
    fn test_fixed_time_source_is_stable() {
        let source = FixedTimeSource::from_unix(500);
        assert_eq!(source.now(), source.now());
    }
}
