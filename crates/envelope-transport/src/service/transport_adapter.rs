//! Transport Adapter Service
//!
//! Turns one caller request into one envelope and drives every configured
//! destination with it.
//!
//! ## Fan-out Rules
//!
//! - Every destination is invoked exactly once per call, with the same
//!   immutable envelope.
//! - A destination's error or panic is recorded in its own outcome and
//!   never stops the others.
//! - Nothing is retried or deduplicated here; destinations are invoked
//!   concurrently and no ordering between them is promised.
//! - An envelope that fails validation reaches no destination; every
//!   outcome then carries the `SerializationError`.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use futures::FutureExt;
use shared_types::{Envelope, Event, EventId, Session, TraceContext, UserFeedback};
use tracing::{debug, error, warn};

use crate::adapters::time::SystemTimeSource;
use crate::codec::serializer;
use crate::domain::{AdapterConfig, Assembled, Attachment, EnvelopeBuilder};
use crate::error::{AttachmentError, ConfigError, DeliveryError, SerializationError, TransportError};
use crate::metrics::AdapterMetrics;
use crate::ports::inbound::{DestinationOutcome, DispatchReport, Operation, TransportAdapterApi};
use crate::ports::outbound::{TimeSource, Transport};

/// Fan-out dispatcher over a fixed list of destinations.
///
/// Stateless per call: the destination list, builder options and clock are
/// fixed at construction. Safe to share between tasks.
pub struct TransportAdapter {
    destinations: Vec<Arc<dyn Transport>>,
    builder: EnvelopeBuilder,
    metrics: AdapterMetrics,
}

impl TransportAdapter {
    /// Create an adapter that stamps default timestamps from system time.
    pub fn new(
        destinations: Vec<Arc<dyn Transport>>,
        config: AdapterConfig,
    ) -> Result<Self, ConfigError> {
        Self::with_time_source(destinations, config, Arc::new(SystemTimeSource))
    }

    /// Create an adapter with an explicit clock.
    pub fn with_time_source(
        destinations: Vec<Arc<dyn Transport>>,
        config: AdapterConfig,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            destinations,
            builder: EnvelopeBuilder::new(&config, clock),
            metrics: AdapterMetrics::new(),
        })
    }

    /// The builder used for every envelope.
    pub fn builder(&self) -> &EnvelopeBuilder {
        &self.builder
    }

    pub fn destination_count(&self) -> usize {
        self.destinations.len()
    }

    pub fn metrics(&self) -> &AdapterMetrics {
        &self.metrics
    }

    async fn dispatch_assembled(
        &self,
        operation: Operation,
        event_id: Option<EventId>,
        assembled: Result<Assembled, SerializationError>,
    ) -> DispatchReport {
        match assembled {
            Ok(Assembled { envelope, rejected }) => {
                self.dispatch(operation, event_id, Ok(envelope), rejected).await
            }
            Err(err) => self.dispatch(operation, event_id, Err(err), Vec::new()).await,
        }
    }

    async fn dispatch(
        &self,
        operation: Operation,
        event_id: Option<EventId>,
        built: Result<Envelope, SerializationError>,
        dropped_attachments: Vec<AttachmentError>,
    ) -> DispatchReport {
        self.metrics.record_attachments_dropped(dropped_attachments.len());

        let envelope = match built.and_then(|envelope| validate(&envelope).map(|()| envelope)) {
            Ok(envelope) => envelope,
            Err(err) => {
                error!(
                    event_id = ?event_id,
                    operation = ?operation,
                    error = %err,
                    "Envelope rejected before fan-out"
                );
                self.metrics.record_rejected();
                return self.rejected_report(operation, event_id, dropped_attachments, err);
            }
        };

        self.metrics.record_dispatch(operation);
        let outcomes = self.fan_out(operation, &envelope).await;

        DispatchReport {
            operation,
            event_id: envelope.event_id(),
            item_count: envelope.len(),
            dropped_attachments,
            outcomes,
        }
    }

    async fn fan_out(&self, operation: Operation, envelope: &Envelope) -> Vec<DestinationOutcome> {
        let calls = self
            .destinations
            .iter()
            .enumerate()
            .map(|(index, destination)| async move {
                let call = async {
                    match operation {
                        Operation::Send => destination.send(envelope).await,
                        Operation::Store => destination.store(envelope).await,
                    }
                };
                let result = AssertUnwindSafe(call)
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        Err(TransportError::Other("destination panicked".to_string()))
                    });
                (index, destination.name().to_string(), result)
            });

        join_all(calls)
            .await
            .into_iter()
            .map(|(index, name, result)| {
                match &result {
                    Ok(()) => debug!(
                        destination = %name,
                        operation = ?operation,
                        event_id = ?envelope.event_id(),
                        items = envelope.len(),
                        "Envelope accepted"
                    ),
                    Err(err) => warn!(
                        destination = %name,
                        operation = ?operation,
                        event_id = ?envelope.event_id(),
                        error = %err,
                        "Destination failed"
                    ),
                }
                self.metrics.record_destination(result.is_ok());
                DestinationOutcome {
                    index,
                    destination: name,
                    result: result.map_err(DeliveryError::from),
                }
            })
            .collect()
    }

    fn rejected_report(
        &self,
        operation: Operation,
        event_id: Option<EventId>,
        dropped_attachments: Vec<AttachmentError>,
        err: SerializationError,
    ) -> DispatchReport {
        let outcomes = self
            .destinations
            .iter()
            .enumerate()
            .map(|(index, destination)| DestinationOutcome {
                index,
                destination: destination.name().to_string(),
                result: Err(DeliveryError::Serialization(err.clone())),
            })
            .collect();

        DispatchReport {
            operation,
            event_id,
            item_count: 0,
            dropped_attachments,
            outcomes,
        }
    }
}

/// Envelopes handed to destinations must have items and consistent lengths.
fn validate(envelope: &Envelope) -> Result<(), SerializationError> {
    if envelope.is_empty() {
        return Err(SerializationError::EmptyEnvelope);
    }
    serializer::verify(envelope)
}

#[async_trait]
impl TransportAdapterApi for TransportAdapter {
    async fn send_event_with_session(
        &self,
        event: &Event,
        session: Option<&Session>,
        attachments: &[Attachment],
    ) -> DispatchReport {
        let assembled = self
            .builder
            .for_event_with_session_and_attachments(event, session, attachments);
        self.dispatch_assembled(Operation::Send, Some(event.event_id), assembled).await
    }

    async fn send_event_with_trace_context(
        &self,
        event: &Event,
        trace_context: Option<&TraceContext>,
        attachments: &[Attachment],
    ) -> DispatchReport {
        let assembled = self
            .builder
            .for_event_with_trace_context_and_attachments(event, trace_context, attachments);
        self.dispatch_assembled(Operation::Send, Some(event.event_id), assembled).await
    }

    async fn send_user_feedback(&self, feedback: &UserFeedback) -> DispatchReport {
        let built = self.builder.for_user_feedback(feedback);
        self.dispatch(Operation::Send, Some(feedback.event_id), built, Vec::new()).await
    }

    async fn send_session(&self, session: &Session) -> DispatchReport {
        let built = self.builder.for_session(session);
        self.dispatch(Operation::Send, None, built, Vec::new()).await
    }

    async fn send_envelope(&self, envelope: Envelope) -> DispatchReport {
        let event_id = envelope.event_id();
        self.dispatch(Operation::Send, event_id, Ok(envelope), Vec::new()).await
    }

    async fn save_event(
        &self,
        event: &Event,
        trace_context: Option<&TraceContext>,
    ) -> DispatchReport {
        let built = self.builder.for_event_only(event, trace_context);
        self.dispatch(Operation::Store, Some(event.event_id), built, Vec::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::InMemoryTransport;
    use crate::adapters::time::FixedTimeSource;
    use shared_types::{EnvelopeHeader, SdkInfo};

    fn adapter(destinations: Vec<Arc<dyn Transport>>) -> TransportAdapter {
        TransportAdapter::with_time_source(
            destinations,
            AdapterConfig::default(),
            Arc::new(FixedTimeSource::from_unix(1_700_000_000)),
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = AdapterConfig::default().with_max_attachment_size(0);
        let result = TransportAdapter::new(Vec::new(), config);
        assert!(matches!(result, Err(ConfigError::ZeroAttachmentSize)));
    }

    #[tokio::test]
    async fn test_no_destinations_reports_nothing() {
        let sut = adapter(Vec::new());
        let report = sut.send_user_feedback(&UserFeedback::new(EventId::new())).await;
        assert!(report.outcomes.is_empty());
        assert!(report.all_accepted());
        assert_eq!(report.item_count, 1);
    }

    #[tokio::test]
    async fn test_empty_envelope_reaches_no_destination() {
        let transport = Arc::new(InMemoryTransport::new("primary"));
        let sut = adapter(vec![transport.clone()]);

        let empty = Envelope::new(EnvelopeHeader::new(None, SdkInfo::new("x", "1")), Vec::new());
        let report = sut.send_envelope(empty).await;

        assert_eq!(transport.sent_envelopes().len(), 0);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(
            report.outcomes[0].result,
            Err(DeliveryError::Serialization(SerializationError::EmptyEnvelope))
        );
        assert_eq!(sut.metrics().snapshot().envelopes_rejected, 1);
    }

    #[tokio::test]
    async fn test_save_uses_store_only() {
        let transport = Arc::new(InMemoryTransport::new("disk"));
        let sut = adapter(vec![transport.clone()]);

        let report = sut.save_event(&Event::new(EventId::new()), None).await;

        assert_eq!(report.operation, Operation::Store);
        assert_eq!(transport.stored_envelopes().len(), 1);
        assert!(transport.sent_envelopes().is_empty());
        assert_eq!(sut.metrics().snapshot().envelopes_stored, 1);
    }

    #[tokio::test]
    async fn test_dropped_attachments_are_counted() {
        let sut = adapter(vec![Arc::new(InMemoryTransport::new("primary"))]);
        let report = sut
            .send_event_with_trace_context(
                &Event::new(EventId::new()),
                None,
                &[Attachment::from_path(""), Attachment::from_bytes(vec![1], "ok.bin")],
            )
            .await;

        assert_eq!(report.item_count, 2);
        assert_eq!(report.dropped_attachments.len(), 1);
        assert_eq!(sut.metrics().snapshot().attachments_dropped, 1);
    }
}
