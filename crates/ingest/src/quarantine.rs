use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use opspulse_core::QuarantineEvent;

/// Sink for rejected messages (spec.md §3: "append-only... retained for
/// diagnostics and policy-driven retention").
///
/// No backing store for quarantine events exists in `opspulse-state` yet —
/// the pipeline only needs counters and a diagnostic trail today, so this
/// trait is kept local and swappable rather than growing the state crate's
/// trait surface speculatively.
#[async_trait]
pub trait QuarantineSink: Send + Sync {
    async fn record(&self, event: QuarantineEvent);
}

/// Default sink: emits a structured `tracing` event per quarantined message.
pub struct TracingQuarantineSink;

#[async_trait]
impl QuarantineSink for TracingQuarantineSink {
    async fn record(&self, event: QuarantineEvent) {
        tracing::warn!(
            tenant = event.tenant_id.as_str(),
            device = event.device_id.as_ref().map(opspulse_core::DeviceId::as_str),
            reason = ?event.reason,
            "message quarantined"
        );
    }
}

/// A bounded in-memory ring of the most recent quarantine events, logged the
/// same way as [`TracingQuarantineSink`] but also retained so an operator
/// can review them through the admin API or CLI. Oldest events fall off
/// once `capacity` is reached; this is a diagnostic window, not a durable
/// audit log.
pub struct InMemoryQuarantineSink {
    capacity: usize,
    events: Mutex<VecDeque<QuarantineEvent>>,
}

impl InMemoryQuarantineSink {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { capacity, events: Mutex::new(VecDeque::with_capacity(capacity)) }
    }

    /// Most recent events first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<QuarantineEvent> {
        let events = self.events.lock().expect("quarantine ring mutex poisoned");
        events.iter().rev().take(limit).cloned().collect()
    }
}

impl Default for InMemoryQuarantineSink {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[async_trait]
impl QuarantineSink for InMemoryQuarantineSink {
    async fn record(&self, event: QuarantineEvent) {
        tracing::warn!(
            tenant = event.tenant_id.as_str(),
            device = event.device_id.as_ref().map(opspulse_core::DeviceId::as_str),
            reason = ?event.reason,
            "message quarantined"
        );
        let mut events = self.events.lock().expect("quarantine ring mutex poisoned");
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }
}
