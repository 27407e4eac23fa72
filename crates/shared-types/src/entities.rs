//! # Core Domain Entities
//!
//! The externally produced value objects that the SDK core packages into
//! envelopes. The core only reads these; ownership stays with the caller.
//!
//! ## Clusters
//!
//! - **Identity**: `EventId`, `SdkInfo`
//! - **Errors**: `Event`, `Level`, `EventKind`
//! - **Health**: `Session`, `SessionStatus`, `SessionAttributes`
//! - **Feedback & Tracing**: `UserFeedback`, `TraceContext`
//!
//! Every map is a `BTreeMap` so that logically equal objects serialize to
//! identical bytes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::skip_serializing_none;
use uuid::Uuid;

use crate::errors::ModelError;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Identifier of a single event.
///
/// On the wire this is 32 lowercase hex characters without dashes. Parsing
/// accepts any textual UUID form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EventId(Uuid);

impl EventId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The all-zero identifier.
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for EventId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ModelError::InvalidEventId(s.to_string()))
    }
}

impl Serialize for EventId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Name and version of the SDK producing envelopes. Constant per process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SdkInfo {
    /// SDK name, e.g. `envelope-transport`.
    pub name: String,
    /// SDK version string.
    pub version: String,
}

impl SdkInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

// =============================================================================
// CLUSTER B: ERROR EVENTS
// =============================================================================

/// Severity of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warning,
    #[default]
    Error,
    Fatal,
}

/// Whether an event is a plain error event or a performance transaction.
///
/// Transactions travel in a `transaction` item instead of an `event` item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    #[default]
    Event,
    Transaction,
}

impl EventKind {
    fn is_default(&self) -> bool {
        *self == EventKind::Event
    }
}

/// An error event as captured by the host SDK.
///
/// How the event was captured (signal handlers, panics, unwinding) is not a
/// concern of this crate.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier; also anchors the envelope header.
    pub event_id: EventId,

    /// Event kind. Omitted on the wire for plain events.
    #[serde(rename = "type", default, skip_serializing_if = "EventKind::is_default")]
    pub kind: EventKind,

    /// When the event happened. Filled in from the builder's clock if absent.
    pub timestamp: Option<DateTime<Utc>>,

    /// Severity.
    #[serde(default)]
    pub level: Level,

    /// Platform of the producing runtime.
    pub platform: String,

    pub message: Option<String>,
    pub logger: Option<String>,
    pub release: Option<String>,
    pub environment: Option<String>,
    pub transaction: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,

    /// Structured contexts (`trace`, `os`, `device`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub contexts: BTreeMap<String, serde_json::Value>,
}

impl Event {
    /// Create an event with the given id and no timestamp.
    pub fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            kind: EventKind::Event,
            timestamp: None,
            level: Level::default(),
            platform: "native".to_string(),
            message: None,
            logger: None,
            release: None,
            environment: None,
            transaction: None,
            tags: BTreeMap::new(),
            extra: BTreeMap::new(),
            contexts: BTreeMap::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_kind(mut self, kind: EventKind) -> Self {
        self.kind = kind;
        self
    }
}

// =============================================================================
// CLUSTER C: RELEASE HEALTH
// =============================================================================

/// Status of a session at the time it was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Ok,
    Exited,
    Crashed,
    Abnormal,
}

/// Release attributes attached to a session.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionAttributes {
    pub release: String,
    pub environment: Option<String>,
}

/// A release-health session snapshot.
///
/// When a session starts, ends, or is marked crashed is decided elsewhere;
/// this is only the value that gets packaged.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier.
    pub sid: Uuid,
    /// Distinct (user/installation) identifier.
    pub did: Option<String>,
    /// True for the first update of a session.
    #[serde(default)]
    pub init: bool,
    pub started: DateTime<Utc>,
    /// Time of this update.
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: SessionStatus,
    #[serde(default)]
    pub errors: u64,
    /// Sequence number of this update.
    #[serde(default)]
    pub seq: u64,
    /// Duration in seconds, for ended sessions.
    pub duration: Option<f64>,
    pub attrs: SessionAttributes,
}

impl Session {
    /// Start a new session for a release at the given instant.
    pub fn new(
        release: impl Into<String>,
        distinct_id: Option<String>,
        started: DateTime<Utc>,
    ) -> Self {
        Self {
            sid: Uuid::new_v4(),
            did: distinct_id,
            init: true,
            started,
            timestamp: started,
            status: SessionStatus::Ok,
            errors: 0,
            seq: 0,
            duration: None,
            attrs: SessionAttributes {
                release: release.into(),
                environment: None,
            },
        }
    }
}

// =============================================================================
// CLUSTER D: FEEDBACK & TRACING
// =============================================================================

/// Feedback a user submitted about a specific event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFeedback {
    /// The event this feedback refers to.
    pub event_id: EventId,
    pub name: String,
    pub email: String,
    pub comments: String,
}

impl UserFeedback {
    pub fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            name: String::new(),
            email: String::new(),
            comments: String::new(),
        }
    }
}

/// Distributed-tracing metadata carried with an event.
///
/// It never becomes an envelope item of its own; it is embedded in the
/// event payload under `contexts.trace`.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// 32 hex character trace identifier.
    pub trace_id: String,
    /// Public key of the project the trace started in.
    pub public_key: String,
    pub release: Option<String>,
    pub environment: Option<String>,
    pub transaction: Option<String>,
    pub user_segment: Option<String>,
    /// Sample rate as a decimal string, kept textual for exact round trips.
    pub sample_rate: Option<String>,
}

impl TraceContext {
    pub fn new(trace_id: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            public_key: public_key.into(),
            release: None,
            environment: None,
            transaction: None,
            user_segment: None,
            sample_rate: None,
        }
    }
}
