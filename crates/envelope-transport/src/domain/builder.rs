//! Envelope Builder
//!
//! Pure assembly of one `Envelope` from already-produced domain objects.
//!
//! ## Committed Item Order
//!
//! 1. The event item (trace context embedded in its payload, never a
//!    separate item)
//! 2. Attachment items, in input order, minus the ones the encoder rejected
//! 3. The session or user-feedback item
//!
//! Equal inputs always give equal envelopes: the only time-dependent value
//! (the default event timestamp) comes from the injected `TimeSource`.

use std::borrow::Cow;
use std::sync::Arc;

use shared_types::{
    Envelope, EnvelopeHeader, Event, Item, SdkInfo, Session, TraceContext, UserFeedback,
};
use tracing::{debug, warn};

use crate::domain::attachment::{self, Attachment};
use crate::domain::config::AdapterConfig;
use crate::error::{AttachmentError, SerializationError};
use crate::ports::outbound::TimeSource;

/// Key under which a trace context is embedded in the event's `contexts`.
pub const TRACE_CONTEXT_KEY: &str = "trace";

/// An envelope together with the attachments that did not make it in.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub envelope: Envelope,
    pub rejected: Vec<AttachmentError>,
}

/// Builds envelopes for a fixed SDK identity, attachment cap and clock.
#[derive(Clone)]
pub struct EnvelopeBuilder {
    sdk_info: SdkInfo,
    max_attachment_size: u64,
    clock: Arc<dyn TimeSource>,
}

impl EnvelopeBuilder {
    pub fn new(config: &AdapterConfig, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            sdk_info: config.sdk_info.clone(),
            max_attachment_size: config.max_attachment_size,
            clock,
        }
    }

    pub fn sdk_info(&self) -> &SdkInfo {
        &self.sdk_info
    }

    pub fn max_attachment_size(&self) -> u64 {
        self.max_attachment_size
    }

    /// Event, then surviving attachments, then the session if present.
    pub fn for_event_with_session_and_attachments(
        &self,
        event: &Event,
        session: Option<&Session>,
        attachments: &[Attachment],
    ) -> Result<Assembled, SerializationError> {
        let mut items = vec![self.event_item(event, None)?];
        let rejected = self.push_attachments(&mut items, attachments);
        if let Some(session) = session {
            items.push(Item::from_session(session)?);
        }
        Ok(self.assemble(Some(event), items, rejected))
    }

    /// Event carrying the trace context, then surviving attachments.
    pub fn for_event_with_trace_context_and_attachments(
        &self,
        event: &Event,
        trace_context: Option<&TraceContext>,
        attachments: &[Attachment],
    ) -> Result<Assembled, SerializationError> {
        let mut items = vec![self.event_item(event, trace_context)?];
        let rejected = self.push_attachments(&mut items, attachments);
        Ok(self.assemble(Some(event), items, rejected))
    }

    /// Single user-feedback item anchored to the feedback's event.
    pub fn for_user_feedback(
        &self,
        feedback: &UserFeedback,
    ) -> Result<Envelope, SerializationError> {
        Ok(Envelope::for_user_feedback(feedback, self.sdk_info.clone())?)
    }

    /// Single event item, used by the persistence path.
    ///
    /// Never includes attachments or a session.
    pub fn for_event_only(
        &self,
        event: &Event,
        trace_context: Option<&TraceContext>,
    ) -> Result<Envelope, SerializationError> {
        let items = vec![self.event_item(event, trace_context)?];
        Ok(self.assemble(Some(event), items, Vec::new()).envelope)
    }

    /// Sessions-only envelope; not anchored to any event.
    pub fn for_session(&self, session: &Session) -> Result<Envelope, SerializationError> {
        let items = vec![Item::from_session(session)?];
        Ok(self.assemble(None, items, Vec::new()).envelope)
    }

    fn event_item(
        &self,
        event: &Event,
        trace_context: Option<&TraceContext>,
    ) -> Result<Item, SerializationError> {
        let mut event = Cow::Borrowed(event);
        if event.timestamp.is_none() {
            event.to_mut().timestamp = Some(self.clock.now());
        }
        if let Some(trace) = trace_context {
            let value = serde_json::to_value(trace)?;
            event
                .to_mut()
                .contexts
                .insert(TRACE_CONTEXT_KEY.to_string(), value);
        }
        Ok(Item::from_event(&event)?)
    }

    fn push_attachments(
        &self,
        items: &mut Vec<Item>,
        attachments: &[Attachment],
    ) -> Vec<AttachmentError> {
        let mut rejected = Vec::new();
        for attachment in attachments {
            match attachment::encode(attachment, self.max_attachment_size) {
                Ok(item) => items.push(item),
                Err(err) => {
                    warn!(
                        filename = %err.filename(),
                        error = %err,
                        "Attachment dropped from envelope"
                    );
                    rejected.push(err);
                }
            }
        }
        rejected
    }

    fn assemble(
        &self,
        event: Option<&Event>,
        items: Vec<Item>,
        rejected: Vec<AttachmentError>,
    ) -> Assembled {
        let header = EnvelopeHeader::new(event.map(|e| e.event_id), self.sdk_info.clone());
        let envelope = Envelope::new(header, items);
        debug!(
            event_id = ?envelope.event_id(),
            items = envelope.len(),
            dropped = rejected.len(),
            "Envelope assembled"
        );
        Assembled { envelope, rejected }
    }
}
