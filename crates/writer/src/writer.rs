use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use opspulse_core::TenantId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::WriterConfig;
use crate::sink::LineSink;
use crate::stats::{Counters, WriterStats};

struct Control {
    shutdown: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Per-tenant line-buffered writer to the time-series store (spec.md §4.2).
///
/// One buffer per tenant; a flush emits a single write per tenant containing
/// its buffered lines joined by newlines. `add` is non-blocking except at
/// the instant it triggers a size-driven flush, which it awaits inline.
pub struct BatchWriter {
    config: WriterConfig,
    sink: Arc<dyn LineSink>,
    buffers: DashMap<TenantId, Mutex<Vec<String>>>,
    counters: Counters,
    control: Mutex<Option<Control>>,
}

impl BatchWriter {
    #[must_use]
    pub fn new(config: WriterConfig, sink: Arc<dyn LineSink>) -> Arc<Self> {
        Arc::new(Self {
            config,
            sink,
            buffers: DashMap::new(),
            counters: Counters::default(),
            control: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn stats(&self) -> WriterStats {
        self.counters.snapshot()
    }

    /// Append a line to `tenant_id`'s buffer. Triggers and awaits a flush if
    /// the buffer just reached `batch_size`.
    pub async fn add(&self, tenant_id: &TenantId, line: String) {
        let should_flush = {
            let slot = self
                .buffers
                .entry(tenant_id.clone())
                .or_insert_with(|| Mutex::new(Vec::new()));
            let mut buf = slot.lock().expect("batch writer buffer mutex poisoned");
            buf.push(line);
            buf.len() >= self.config.batch_size
        };
        if should_flush {
            self.flush_tenant(tenant_id).await;
        }
    }

    /// Flush every tenant's buffer, regardless of size.
    pub async fn flush_all(&self) {
        let tenants: Vec<TenantId> = self.buffers.iter().map(|e| e.key().clone()).collect();
        for tenant_id in tenants {
            self.flush_tenant(&tenant_id).await;
        }
    }

    async fn flush_tenant(&self, tenant_id: &TenantId) {
        let lines = {
            let Some(slot) = self.buffers.get(tenant_id) else {
                return;
            };
            let mut buf = slot.lock().expect("batch writer buffer mutex poisoned");
            if buf.is_empty() {
                return;
            }
            std::mem::take(&mut *buf)
        };

        let body = lines.join("\n");
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.sink.write_batch(tenant_id, &body).await {
                Ok(()) => {
                    self.counters.record_ok();
                    debug!(tenant = tenant_id.as_str(), lines = lines.len(), "batch flushed");
                    return;
                }
                Err(e) if attempt < self.config.max_tries => {
                    warn!(tenant = tenant_id.as_str(), attempt, error = %e, "batch write failed, retrying");
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => {
                    self.counters.record_err();
                    warn!(
                        tenant = tenant_id.as_str(),
                        attempt,
                        error = %e,
                        lines = lines.len(),
                        "batch write exhausted retries, discarding"
                    );
                    return;
                }
            }
        }
    }

    /// Spawn the periodic flush task. No-op if already started.
    pub fn start(self: &Arc<Self>) {
        let mut control = self.control.lock().expect("batch writer control mutex poisoned");
        if control.is_some() {
            return;
        }
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let writer = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(writer.config.flush_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = ticker.tick() => {
                        writer.flush_all().await;
                    }
                }
            }
        });
        *control = Some(Control {
            shutdown: shutdown_tx,
            handle,
        });
    }

    /// Cancel the periodic flush task, then drain remaining buffers.
    pub async fn stop(&self) {
        let control = self.control.lock().expect("batch writer control mutex poisoned").take();
        if let Some(control) = control {
            let _ = control.shutdown.send(()).await;
            let _ = control.handle.await;
        }
        self.flush_all().await;
    }
}
