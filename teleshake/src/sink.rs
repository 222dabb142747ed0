//! Event sinks
//!
//! A [`Device`](crate::Device) reports every connection attempt, telegram,
//! checksum outcome and phase transition to the sink it was built with.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use teleshake_types::{EventKind, ProtocolEvent};

/// Receiver of protocol events
pub trait EventSink: Send + Sync {
    /// Record one event
    fn record(&self, event: ProtocolEvent);
}

/// Forwards events to `tracing`
///
/// Failures are logged at `WARN`, everything else at `INFO`. Timestamps come
/// from the subscriber, so only the event kind is rendered.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: ProtocolEvent) {
        if event.is_failure() {
            warn!(target: "teleshake::events", "{}", event.kind);
        } else {
            info!(target: "teleshake::events", "{}", event.kind);
        }
    }
}

/// Keeps events in memory
///
/// Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<ProtocolEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events
    pub fn events(&self) -> Vec<ProtocolEvent> {
        self.events.lock().clone()
    }

    /// Snapshot of recorded event kinds
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(|e| e.kind.clone()).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: ProtocolEvent) {
        self.events.lock().push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn record(&self, event: ProtocolEvent) {
        (**self).record(event);
    }
}
