use std::sync::Arc;

use chrono::Utc;
use opspulse_cache::AuthCache;
use opspulse_core::{encode_heartbeat, encode_telemetry, DeviceId, QuarantineEvent, QuarantineReason, TenantId};
use opspulse_state::{DeviceRegistryStore, DeviceStateStore, LatestSampleStore};
use opspulse_writer::BatchWriter;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::config::IngestConfig;
use crate::message::{parse_raw, salvage_identity};
use crate::quarantine::QuarantineSink;
use crate::ratelimit::RateLimiter;
use crate::stats::{Counters, IngestStats};
use crate::validate::{validate_message, ValidateFailure, ValidatedMessage};

/// Dependencies shared by every worker in the pool.
pub struct IngestDeps {
    pub cache: Arc<AuthCache>,
    pub registry: Arc<dyn DeviceRegistryStore>,
    pub device_state: Arc<dyn DeviceStateStore>,
    pub latest_samples: Arc<dyn LatestSampleStore>,
    pub writer: Arc<BatchWriter>,
    pub quarantine: Arc<dyn QuarantineSink>,
}

/// Returned by [`IngestPipeline::submit`] when the bounded queue is full —
/// the caller (HTTP/MQTT ingress) should reject with 429 (spec.md §4.3).
#[derive(Debug, Clone, Copy)]
pub struct QueueFullError;

struct Shared {
    deps: IngestDeps,
    rate_limiter: RateLimiter,
    counters: Counters,
}

/// The ingestion worker pool (C3): `N` cooperative workers sharing one
/// bounded queue, one auth cache, and one batch writer.
pub struct IngestPipeline {
    tx: mpsc::Sender<String>,
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl IngestPipeline {
    /// Spawn the worker pool and return a handle. `deps` is moved in once;
    /// every worker task shares it through the pool's `Arc`.
    #[must_use]
    pub fn spawn(config: IngestConfig, deps: IngestDeps) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let rx = Arc::new(AsyncMutex::new(rx));
        let shared = Arc::new(Shared {
            deps,
            rate_limiter: RateLimiter::new(config.rate_limit_per_sec, config.rate_limit_burst),
            counters: Counters::default(),
        });

        let mut workers = Vec::with_capacity(config.worker_count);
        for _ in 0..config.worker_count {
            let rx = Arc::clone(&rx);
            let shared = Arc::clone(&shared);
            workers.push(tokio::spawn(async move {
                loop {
                    let raw = {
                        let mut guard = rx.lock().await;
                        guard.recv().await
                    };
                    let Some(raw) = raw else { break };
                    process_one(&raw, &shared).await;
                }
            }));
        }

        Arc::new(Self { tx, shared, workers })
    }

    /// Enqueue a raw message. Non-blocking; returns [`QueueFullError`] under
    /// backpressure instead of awaiting queue space.
    pub fn submit(&self, raw: String) -> Result<(), QueueFullError> {
        self.tx.try_send(raw).map_err(|_| QueueFullError)
    }

    #[must_use]
    pub fn stats(&self) -> IngestStats {
        self.shared.counters.snapshot()
    }

    /// Stop accepting new messages and abort in-flight workers. Any message
    /// already handed to a worker may or may not finish; callers that need a
    /// clean drain should stop submitting and poll `stats()` first.
    pub async fn shutdown(&self) {
        for handle in &self.workers {
            handle.abort();
        }
    }
}

async fn process_one(raw: &str, shared: &Shared) {
    let deps = &shared.deps;

    let msg = match parse_raw(raw) {
        Ok(msg) => msg,
        Err(()) => {
            let (tenant_id, device_id) = salvage_identity(raw);
            let tenant_id = TenantId::new(tenant_id.unwrap_or_else(|| "unknown".to_owned()));
            let device_id = device_id.map(DeviceId::new);
            shared.counters.record_quarantine(QuarantineReason::Malformed);
            deps.quarantine
                .record(QuarantineEvent::new(tenant_id, device_id, QuarantineReason::Malformed, raw, Utc::now()))
                .await;
            return;
        }
    };

    let validated = match validate_message(&msg, &deps.cache, deps.registry.as_ref(), &shared.rate_limiter).await {
        Ok(v) => v,
        Err(ValidateFailure::Quarantine(reason)) => {
            shared.counters.record_quarantine(reason);
            let event = QuarantineEvent::new(
                TenantId::new(msg.tenant_id.clone()),
                Some(DeviceId::new(msg.device_id.clone())),
                reason,
                raw,
                Utc::now(),
            );
            deps.quarantine.record(event).await;
            return;
        }
        Err(ValidateFailure::Backend(e)) => {
            warn!(error = %e, "registry lookup failed, message dropped for retry by source");
            return;
        }
    };

    let now = Utc::now();
    let ns_ts = now.timestamp_nanos_opt().unwrap_or(0);

    match validated {
        ValidatedMessage::Heartbeat { tenant_id, device_id, site_id, seq } => {
            let line = encode_heartbeat(&device_id, &site_id, seq, ns_ts);
            deps.writer.add(&tenant_id, line).await;
            if let Err(e) = deps.device_state.touch(&tenant_id, &device_id, &site_id, now).await {
                warn!(error = %e, "device_state touch failed");
            }
        }
        ValidatedMessage::Telemetry { tenant_id, device_id, site_id, seq, fields } => {
            let line = encode_telemetry(&device_id, &site_id, seq, &fields, ns_ts);
            deps.writer.add(&tenant_id, line).await;
            if let Err(e) = deps.device_state.touch(&tenant_id, &device_id, &site_id, now).await {
                warn!(error = %e, "device_state touch failed");
            }
            for (metric_name, value) in &fields {
                if let Err(e) = deps
                    .latest_samples
                    .record(&tenant_id, &device_id, metric_name, value.clone(), now)
                    .await
                {
                    warn!(error = %e, "latest sample record failed");
                }
            }
        }
    }

    shared.counters.record_accepted();
}
