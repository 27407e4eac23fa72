//! # Envelope Wire Model
//!
//! The self-describing unit handed to every delivery destination: one
//! `EnvelopeHeader` followed by an ordered sequence of typed `Item`s.
//!
//! ## Invariants
//!
//! - **Length Integrity**: an `Item`'s header length always equals its
//!   payload byte count. `Item` fields are private and every constructor
//!   computes or checks the length.
//! - **Immutability**: items and envelopes are never mutated after
//!   construction; fan-out hands out shared references only.
//! - **Committed Order**: builders emit the event item first, attachments in
//!   input order, and session/user-feedback items last. Order matters for the
//!   serialized bytes; [`Envelope::is_equivalent`] ignores it.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::skip_serializing_none;

use crate::entities::{Event, EventId, EventKind, SdkInfo, Session, UserFeedback};
use crate::errors::ModelError;

/// Content type of every JSON-encoded item.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Content type used for attachments that do not declare one.
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

// =============================================================================
// ITEM TYPE
// =============================================================================

/// The kind of payload an item carries.
///
/// Unknown wire names are preserved verbatim so that envelopes produced by
/// newer SDKs survive a decode/encode cycle unchanged.
///
/// Equality, ordering and hashing follow the wire name, so `Other("event")`
/// is the same type as `Event`.
#[derive(Debug, Clone)]
pub enum ItemType {
    Event,
    Transaction,
    Attachment,
    Session,
    UserFeedback,
    Other(String),
}

impl ItemType {
    /// The name used on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            ItemType::Event => "event",
            ItemType::Transaction => "transaction",
            ItemType::Attachment => "attachment",
            ItemType::Session => "session",
            ItemType::UserFeedback => "user_report",
            ItemType::Other(name) => name,
        }
    }

    /// Parse a wire name, mapping known names to their variants.
    pub fn from_wire(name: &str) -> Self {
        match name {
            "event" => ItemType::Event,
            "transaction" => ItemType::Transaction,
            "attachment" => ItemType::Attachment,
            "session" => ItemType::Session,
            "user_report" => ItemType::UserFeedback,
            other => ItemType::Other(other.to_string()),
        }
    }
}

impl PartialEq for ItemType {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ItemType {}

impl Hash for ItemType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl PartialOrd for ItemType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ItemType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ItemType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ItemType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ItemType::from_wire(&raw))
    }
}

// =============================================================================
// HEADERS
// =============================================================================

/// Per-item header record. Field order is the wire key order.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemHeader {
    /// Payload kind.
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// Exact payload byte count.
    pub length: u64,
    /// MIME-like payload type.
    pub content_type: String,
    /// Original file name, for attachments.
    pub filename: Option<String>,
}

/// Envelope-level header record.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeHeader {
    /// Present when the envelope is anchored to an event.
    pub event_id: Option<EventId>,
    /// The producing SDK.
    #[serde(rename = "sdk")]
    pub sdk_info: SdkInfo,
}

impl EnvelopeHeader {
    pub fn new(event_id: Option<EventId>, sdk_info: SdkInfo) -> Self {
        Self { event_id, sdk_info }
    }
}

// =============================================================================
// ITEM
// =============================================================================

/// One typed, length-prefixed payload unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    header: ItemHeader,
    payload: Vec<u8>,
}

impl Item {
    /// Create an item, deriving the header length from the payload.
    pub fn new(item_type: ItemType, content_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            header: ItemHeader {
                item_type,
                length: payload.len() as u64,
                content_type: content_type.into(),
                filename: None,
            },
            payload,
        }
    }

    /// Create an attachment item carrying its file name.
    pub fn attachment(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        let mut item = Self::new(ItemType::Attachment, content_type, payload);
        item.header.filename = Some(filename.into());
        item
    }

    /// Reassemble an item from a decoded header and payload.
    pub fn from_parts(header: ItemHeader, payload: Vec<u8>) -> Result<Self, ModelError> {
        let actual = payload.len() as u64;
        if header.length != actual {
            return Err(ModelError::LengthMismatch {
                declared: header.length,
                actual,
            });
        }
        Ok(Self { header, payload })
    }

    /// Encode a value as a JSON item of the given type.
    pub fn json<T: Serialize>(item_type: ItemType, value: &T) -> Result<Self, serde_json::Error> {
        let payload = serde_json::to_vec(value)?;
        Ok(Self::new(item_type, CONTENT_TYPE_JSON, payload))
    }

    /// Event item; transactions get a `transaction` item.
    ///
    /// The payload is the event as given. Envelope builders stamp a missing
    /// timestamp first, so only an event that already carries a timestamp
    /// gives the same item as the builder.
    pub fn from_event(event: &Event) -> Result<Self, serde_json::Error> {
        let item_type = match event.kind {
            EventKind::Event => ItemType::Event,
            EventKind::Transaction => ItemType::Transaction,
        };
        Self::json(item_type, event)
    }

    pub fn from_session(session: &Session) -> Result<Self, serde_json::Error> {
        Self::json(ItemType::Session, session)
    }

    pub fn from_user_feedback(feedback: &UserFeedback) -> Result<Self, serde_json::Error> {
        Self::json(ItemType::UserFeedback, feedback)
    }

    pub fn header(&self) -> &ItemHeader {
        &self.header
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn item_type(&self) -> &ItemType {
        &self.header.item_type
    }

    pub fn into_parts(self) -> (ItemHeader, Vec<u8>) {
        (self.header, self.payload)
    }
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// The top-level wire unit: a header plus an ordered sequence of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    header: EnvelopeHeader,
    items: Vec<Item>,
}

impl Envelope {
    pub fn new(header: EnvelopeHeader, items: Vec<Item>) -> Self {
        Self { header, items }
    }

    /// A user-feedback envelope anchored to the feedback's event.
    pub fn for_user_feedback(
        feedback: &UserFeedback,
        sdk_info: SdkInfo,
    ) -> Result<Self, serde_json::Error> {
        let item = Item::from_user_feedback(feedback)?;
        Ok(Self::new(
            EnvelopeHeader::new(Some(feedback.event_id), sdk_info),
            vec![item],
        ))
    }

    pub fn header(&self) -> &EnvelopeHeader {
        &self.header
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn event_id(&self) -> Option<EventId> {
        self.header.event_id
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn into_parts(self) -> (EnvelopeHeader, Vec<Item>) {
        (self.header, self.items)
    }

    /// Semantic equality: same header and the same multiset of items,
    /// regardless of item order.
    pub fn is_equivalent(&self, other: &Envelope) -> bool {
        if self.header != other.header || self.items.len() != other.items.len() {
            return false;
        }
        let mut ours: Vec<&Item> = self.items.iter().collect();
        let mut theirs: Vec<&Item> = other.items.iter().collect();
        ours.sort();
        theirs.sort();
        ours == theirs
    }
}
