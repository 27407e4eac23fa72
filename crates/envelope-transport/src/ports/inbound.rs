//! Inbound Ports (Driving Ports)
//!
//! The API callers use to hand domain objects to the SDK core, and the
//! per-destination report every call returns.

use async_trait::async_trait;
use shared_types::{Envelope, Event, EventId, Session, TraceContext, UserFeedback};

use crate::domain::Attachment;
use crate::error::{AttachmentError, DeliveryError};

/// Which destination capability a fan-out invoked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `Transport::send`
    Send,
    /// `Transport::store`
    Store,
}

/// Result of one destination in a fan-out
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DestinationOutcome {
    /// Position of the destination in the adapter's list
    pub index: usize,
    /// `Transport::name` of the destination
    pub destination: String,
    pub result: Result<(), DeliveryError>,
}

impl DestinationOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// What happened to one `send`/`save` call.
///
/// Callers that only want best-effort delivery can ignore it; callers that
/// need guarantees inspect `outcomes`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchReport {
    pub operation: Operation,
    /// Event the envelope was anchored to, if any
    pub event_id: Option<EventId>,
    /// Items in the dispatched envelope (0 if it was never built)
    pub item_count: usize,
    /// Attachments left out of the envelope
    pub dropped_attachments: Vec<AttachmentError>,
    /// One entry per configured destination, in configuration order
    pub outcomes: Vec<DestinationOutcome>,
}

impl DispatchReport {
    /// True when every destination accepted the envelope.
    pub fn all_accepted(&self) -> bool {
        self.outcomes.iter().all(DestinationOutcome::is_ok)
    }

    pub fn accepted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.accepted_count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &DestinationOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }
}

/// Primary transport adapter API (Driving Port)
///
/// Each call builds exactly one envelope and fans it out to every
/// configured destination. No state is carried between calls.
#[async_trait]
pub trait TransportAdapterApi: Send + Sync {
    /// Event, surviving attachments, then the session if present.
    async fn send_event_with_session(
        &self,
        event: &Event,
        session: Option<&Session>,
        attachments: &[Attachment],
    ) -> DispatchReport;

    /// Event carrying the trace context, then surviving attachments.
    async fn send_event_with_trace_context(
        &self,
        event: &Event,
        trace_context: Option<&TraceContext>,
        attachments: &[Attachment],
    ) -> DispatchReport;

    /// Standalone user feedback.
    async fn send_user_feedback(&self, feedback: &UserFeedback) -> DispatchReport;

    /// Standalone session update.
    async fn send_session(&self, session: &Session) -> DispatchReport;

    /// Fan out an envelope that was built elsewhere.
    async fn send_envelope(&self, envelope: Envelope) -> DispatchReport;

    /// Persist the event alone via `Transport::store` on every destination.
    async fn save_event(&self, event: &Event, trace_context: Option<&TraceContext>)
        -> DispatchReport;
}
