//! # Transport Adapter Integration Tests
//!
//! Drives `TransportAdapter` through its public API with several
//! `InMemoryTransport` destinations and checks what each destination saw.
//!
//! ## Covered Behaviour
//!
//! 1. Item order and content of every envelope kind
//! 2. Attachment rejection without error propagation
//! 3. Exactly one invocation per destination, with identical envelopes
//! 4. Isolation of failing, panicking and stalled destinations
//! 5. Byte-identical output across construction paths
//! 6. One adapter shared by concurrent callers

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use envelope_transport::{
    serialize, AdapterConfig, Attachment, DeliveryError, FixedTimeSource, InMemoryTransport,
    Operation, TimeSource, Transport, TransportAdapter, TransportAdapterApi, TransportError,
};
use shared_types::{
    Envelope, EnvelopeHeader, Event, EventId, Item, ItemType, SdkInfo, Session, TraceContext,
    UserFeedback,
};
use tokio::sync::Notify;
use tokio::time::{sleep, timeout};

const NOW: i64 = 1_700_000_000;

fn adapter_with(destinations: Vec<Arc<dyn Transport>>) -> TransportAdapter {
    TransportAdapter::with_time_source(
        destinations,
        AdapterConfig::default().with_sdk_info(SdkInfo::new("sdk.test", "1.2.3")),
        Arc::new(FixedTimeSource::from_unix(NOW)),
    )
    .unwrap()
}

fn two_destinations() -> (Arc<InMemoryTransport>, Arc<InMemoryTransport>, TransportAdapter) {
    let primary = Arc::new(InMemoryTransport::new("primary"));
    let secondary = Arc::new(InMemoryTransport::new("secondary"));
    let adapter = adapter_with(vec![primary.clone(), secondary.clone()]);
    (primary, secondary, adapter)
}

fn stamped_event() -> Event {
    Event::new(EventId::new())
        .with_message("something broke")
        .with_release("1.0.1")
        .with_timestamp(FixedTimeSource::from_unix(NOW - 5).now())
}

fn session() -> Session {
    Session::new("1.0.1", Some("user-1".to_string()), FixedTimeSource::from_unix(NOW - 60).now())
}

fn types(envelope: &Envelope) -> Vec<ItemType> {
    envelope.items().iter().map(|i| i.item_type().clone()).collect()
}

/// Destination that panics on every call.
struct PanickingTransport;

#[async_trait]
impl Transport for PanickingTransport {
    async fn send(&self, _envelope: &Envelope) -> Result<(), TransportError> {
        panic!("send exploded");
    }

    async fn store(&self, _envelope: &Envelope) -> Result<(), TransportError> {
        panic!("store exploded");
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

/// Destination whose `send` does not finish until released.
struct StalledTransport {
    release: Arc<Notify>,
    inner: InMemoryTransport,
}

#[async_trait]
impl Transport for StalledTransport {
    async fn send(&self, envelope: &Envelope) -> Result<(), TransportError> {
        self.release.notified().await;
        self.inner.send(envelope).await
    }

    async fn store(&self, envelope: &Envelope) -> Result<(), TransportError> {
        self.release.notified().await;
        self.inner.store(envelope).await
    }

    fn name(&self) -> &str {
        "stalled"
    }
}

#[tokio::test]
async fn test_event_session_and_attachment_reach_both_destinations() {
    let (primary, secondary, adapter) = two_destinations();
    let event = stamped_event();

    let report = adapter
        .send_event_with_session(
            &event,
            Some(&session()),
            &[Attachment::from_bytes(b"log line".to_vec(), "app.log")],
        )
        .await;

    assert!(report.all_accepted());
    assert_eq!(report.item_count, 3);
    assert_eq!(report.event_id, Some(event.event_id));

    let sent = primary.sent_envelopes();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        types(&sent[0]),
        vec![ItemType::Event, ItemType::Attachment, ItemType::Session]
    );
    assert_eq!(secondary.sent_envelopes(), sent);
}

#[tokio::test]
async fn test_invalid_attachment_is_skipped_silently() {
    let (primary, _, adapter) = two_destinations();

    let report = adapter
        .send_event_with_trace_context(
            &stamped_event(),
            None,
            &[
                Attachment::from_path("/definitely/not/here.txt"),
                Attachment::from_bytes(b"ok".to_vec(), "ok.txt"),
            ],
        )
        .await;

    assert!(report.all_accepted());
    assert_eq!(report.dropped_attachments.len(), 1);
    assert_eq!(report.dropped_attachments[0].filename(), "here.txt");

    let sent = primary.sent_envelopes();
    assert_eq!(types(&sent[0]), vec![ItemType::Event, ItemType::Attachment]);
    assert_eq!(sent[0].items()[1].header().filename.as_deref(), Some("ok.txt"));
}

#[tokio::test]
async fn test_user_feedback_is_a_single_item() {
    let (primary, _, adapter) = two_destinations();
    let mut feedback = UserFeedback::new(EventId::new());
    feedback.comments = "it crashed on save".to_string();

    adapter.send_user_feedback(&feedback).await;

    let sent = primary.sent_envelopes();
    assert_eq!(types(&sent[0]), vec![ItemType::UserFeedback]);
    assert_eq!(sent[0].items()[0].header().item_type.as_str(), "user_report");
    assert_eq!(sent[0].event_id(), Some(feedback.event_id));
}

#[tokio::test]
async fn test_save_stores_event_only_and_never_sends() {
    let (primary, secondary, adapter) = two_destinations();

    let report = adapter.save_event(&stamped_event(), None).await;

    assert_eq!(report.operation, Operation::Store);
    for destination in [&primary, &secondary] {
        assert!(destination.sent_envelopes().is_empty());
        let stored = destination.stored_envelopes();
        assert_eq!(stored.len(), 1);
        assert_eq!(types(&stored[0]), vec![ItemType::Event]);
    }
}

#[tokio::test]
async fn test_session_update_has_no_event_id() {
    let (primary, _, adapter) = two_destinations();

    let report = adapter.send_session(&session()).await;

    assert!(report.all_accepted());
    assert_eq!(report.event_id, None);
    assert_eq!(types(&primary.sent_envelopes()[0]), vec![ItemType::Session]);
}

#[tokio::test]
async fn test_every_destination_invoked_exactly_once() {
    let destinations: Vec<Arc<InMemoryTransport>> = (0..5)
        .map(|i| Arc::new(InMemoryTransport::new(format!("d{i}"))))
        .collect();
    let adapter = adapter_with(
        destinations
            .iter()
            .map(|d| d.clone() as Arc<dyn Transport>)
            .collect(),
    );
    let trace = TraceContext::new("4bf92f3577b34da6a3ce929d0e0e4736", "public-key");

    let report = adapter
        .send_event_with_trace_context(
            &stamped_event(),
            Some(&trace),
            &[Attachment::from_bytes(vec![1, 2, 3], "raw.bin")],
        )
        .await;

    assert_eq!(report.outcomes.len(), 5);
    let indices: Vec<_> = report.outcomes.iter().map(|o| o.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);

    let first = destinations[0].sent_envelopes();
    assert_eq!(first.len(), 1);
    for destination in &destinations[1..] {
        let sent = destination.sent_envelopes();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].is_equivalent(&first[0]));
    }
}

#[tokio::test]
async fn test_failing_destination_does_not_block_others() {
    let down = Arc::new(InMemoryTransport::failing(
        "down",
        TransportError::Network("connection refused".to_string()),
    ));
    let up = Arc::new(InMemoryTransport::new("up"));
    let adapter = adapter_with(vec![down.clone(), Arc::new(PanickingTransport), up.clone()]);

    let report = adapter.send_event_with_session(&stamped_event(), None, &[]).await;

    assert_eq!(report.accepted_count(), 1);
    assert_eq!(report.failure_count(), 2);
    assert_eq!(
        report.outcomes[0].result,
        Err(DeliveryError::Transport(TransportError::Network(
            "connection refused".to_string()
        )))
    );
    assert_eq!(report.outcomes[1].destination, "panicking");
    assert!(matches!(
        report.outcomes[1].result,
        Err(DeliveryError::Transport(TransportError::Other(_)))
    ));
    assert_eq!(up.sent_envelopes().len(), 1);

    let snapshot = adapter.metrics().snapshot();
    assert_eq!(snapshot.destination_calls, 3);
    assert_eq!(snapshot.destination_failures, 2);
}

#[tokio::test]
async fn test_empty_envelope_reaches_no_destination() {
    let (primary, secondary, adapter) = two_destinations();

    let report = adapter
        .send_envelope(Envelope::new(
            EnvelopeHeader::new(None, SdkInfo::new("x", "1")),
            Vec::new(),
        ))
        .await;

    assert!(primary.sent_envelopes().is_empty());
    assert!(secondary.sent_envelopes().is_empty());
    assert_eq!(report.failure_count(), 2);
    assert_eq!(report.item_count, 0);
}

#[tokio::test]
async fn test_construction_paths_serialize_identically() {
    let (primary, _, adapter) = two_destinations();
    let event = stamped_event();
    let attachment = Attachment::from_bytes(b"same bytes".to_vec(), "same.txt")
        .with_content_type("text/plain");

    adapter
        .send_event_with_session(&event, None, std::slice::from_ref(&attachment))
        .await;
    adapter
        .send_event_with_trace_context(&event, None, std::slice::from_ref(&attachment))
        .await;

    let expected = Envelope::new(
        EnvelopeHeader::new(Some(event.event_id), SdkInfo::new("sdk.test", "1.2.3")),
        vec![
            Item::from_event(&event).unwrap(),
            Item::attachment("same.txt", "text/plain", b"same bytes".to_vec()),
        ],
    );
    let expected_bytes = serialize(&expected).unwrap();

    let sent = primary.sent_envelopes();
    assert_eq!(sent.len(), 2);
    assert_eq!(serialize(&sent[0]).unwrap(), expected_bytes);
    assert_eq!(serialize(&sent[1]).unwrap(), expected_bytes);
}

#[tokio::test]
async fn test_builder_output_matches_delivered_envelope() {
    let (primary, _, adapter) = two_destinations();
    let event = Event::new(EventId::new()).with_message("no timestamp");

    adapter.save_event(&event, None).await;
    adapter.send_event_with_trace_context(&event, None, &[]).await;

    let built = adapter.builder().for_event_only(&event, None).unwrap();
    assert_eq!(primary.stored_envelopes()[0], built);
    assert_eq!(
        serialize(&primary.sent_envelopes()[0]).unwrap(),
        serialize(&built).unwrap()
    );
}

#[tokio::test]
async fn test_metrics_track_operations() {
    let (_, _, adapter) = two_destinations();

    adapter.send_user_feedback(&UserFeedback::new(EventId::new())).await;
    adapter.save_event(&stamped_event(), None).await;
    adapter
        .send_envelope(Envelope::new(
            EnvelopeHeader::new(None, SdkInfo::new("x", "1")),
            Vec::new(),
        ))
        .await;

    let snapshot = adapter.metrics().snapshot();
    assert_eq!(snapshot.envelopes_sent, 1);
    assert_eq!(snapshot.envelopes_stored, 1);
    assert_eq!(snapshot.envelopes_rejected, 1);
    assert_eq!(snapshot.destination_calls, 4);
    assert_eq!(snapshot.destination_failures, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_adapter_serves_concurrent_callers() {
    const CALLERS: usize = 16;
    let (primary, secondary, adapter) = two_destinations();
    let adapter = Arc::new(adapter);
    let event = stamped_event();
    let session = session();

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let adapter = adapter.clone();
            let event = event.clone();
            let session = session.clone();
            tokio::spawn(async move {
                let attachment = Attachment::from_bytes(b"shared".to_vec(), "shared.txt");
                adapter
                    .send_event_with_session(&event, Some(&session), &[attachment])
                    .await
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().all_accepted());
    }

    for destination in [&primary, &secondary] {
        let sent = destination.sent_envelopes();
        assert_eq!(sent.len(), CALLERS);
        assert!(sent.iter().all(|envelope| envelope.is_equivalent(&sent[0])));
    }
    assert_eq!(adapter.metrics().snapshot().envelopes_sent, CALLERS as u64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stalled_destination_does_not_delay_others() {
    let release = Arc::new(Notify::new());
    let stalled = Arc::new(StalledTransport {
        release: release.clone(),
        inner: InMemoryTransport::new("stalled"),
    });
    let up = Arc::new(InMemoryTransport::new("up"));
    let adapter = Arc::new(adapter_with(vec![stalled.clone(), up.clone()]));

    let event = stamped_event();
    let call = {
        let adapter = adapter.clone();
        tokio::spawn(async move { adapter.send_event_with_session(&event, None, &[]).await })
    };

    timeout(Duration::from_secs(5), async {
        while up.sent_envelopes().is_empty() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("second destination should be invoked while the first is stalled");
    assert!(stalled.inner.sent_envelopes().is_empty());
    assert!(!call.is_finished());

    release.notify_one();
    let report = call.await.unwrap();

    assert!(report.all_accepted());
    assert_eq!(stalled.inner.sent_envelopes(), up.sent_envelopes());
}
