//! In-memory destination
//!
//! Keeps every envelope it is handed. Used by tests and by hosts that relay
//! envelopes in-process.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::Envelope;
use tracing::debug;

use crate::error::TransportError;
use crate::ports::outbound::Transport;

/// Destination that records envelopes instead of delivering them.
pub struct InMemoryTransport {
    name: String,
    sent: Mutex<Vec<Envelope>>,
    stored: Mutex<Vec<Envelope>>,
    /// When set, every call fails with this error and records nothing.
    failure: Mutex<Option<TransportError>>,
}

impl InMemoryTransport {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sent: Mutex::new(Vec::new()),
            stored: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    /// A destination that rejects everything with `error`.
    #[must_use]
    pub fn failing(name: impl Into<String>, error: TransportError) -> Self {
        let transport = Self::new(name);
        transport.fail_with(Some(error));
        transport
    }

    /// Switch failure injection on (`Some`) or off (`None`).
    pub fn fail_with(&self, error: Option<TransportError>) {
        *self.failure.lock() = error;
    }

    /// Envelopes received through `send`, oldest first.
    pub fn sent_envelopes(&self) -> Vec<Envelope> {
        self.sent.lock().clone()
    }

    /// Envelopes received through `store`, oldest first.
    pub fn stored_envelopes(&self) -> Vec<Envelope> {
        self.stored.lock().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
        self.stored.lock().clear();
    }

    fn check_failure(&self) -> Result<(), TransportError> {
        match self.failure.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new("in-memory")
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn send(&self, envelope: &Envelope) -> Result<(), TransportError> {
        self.check_failure()?;
        self.sent.lock().push(envelope.clone());
        debug!(destination = %self.name, items = envelope.len(), "Envelope recorded");
        Ok(())
    }

    async fn store(&self, envelope: &Envelope) -> Result<(), TransportError> {
        self.check_failure()?;
        self.stored.lock().push(envelope.clone());
        debug!(destination = %self.name, items = envelope.len(), "Envelope stored");
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
