use std::sync::Arc;
use std::sync::Mutex;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use opspulse_core::{backoff_delay, DeliveryJob};
use opspulse_provider::new_correlation_id;
use opspulse_state::{DeliveryJobStore, RouteStore};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::DeliveryConfig;
use crate::jitter::jitter_for;
use crate::resolve::resolve_integration;
use crate::senders::SenderRegistry;

struct Control {
    shutdown: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// The delivery worker (C6): claims leased batches of due jobs and
/// dispatches each through the sender matching its integration kind.
pub struct DeliveryWorker {
    config: DeliveryConfig,
    routes: Arc<dyn RouteStore>,
    jobs: Arc<dyn DeliveryJobStore>,
    senders: SenderRegistry,
    control: Mutex<Option<Control>>,
}

impl DeliveryWorker {
    #[must_use]
    pub fn new(config: DeliveryConfig, routes: Arc<dyn RouteStore>, jobs: Arc<dyn DeliveryJobStore>, senders: SenderRegistry) -> Arc<Self> {
        Arc::new(Self { config, routes, jobs, senders, control: Mutex::new(None) })
    }

    /// Claim and dispatch one batch of due jobs. Returns the number of jobs
    /// claimed this tick.
    pub async fn tick(&self) -> usize {
        let now = Utc::now();
        let lease_until = now + chrono::Duration::from_std(self.config.lease_duration).unwrap_or(chrono::Duration::seconds(30));
        let claimed = match self
            .jobs
            .claim_due(now, self.config.delivery_concurrency as u32, &self.config.worker_id, lease_until)
            .await
        {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!(error = %e, "failed to claim due delivery jobs");
                return 0;
            }
        };
        let claimed_count = claimed.len();

        stream::iter(claimed)
            .for_each_concurrent(self.config.delivery_concurrency, |job| async move {
                self.dispatch_one(job).await;
            })
            .await;

        claimed_count
    }

    async fn dispatch_one(&self, job: DeliveryJob) {
        let job_id = job.job_id.clone();
        let integration = match resolve_integration(self.routes.as_ref(), &job.tenant_id, &job.route_id).await {
            Ok(integration) => integration,
            Err(e) => {
                warn!(job = job_id.as_str(), error = %e, "delivery job's route/integration vanished, marking dead");
                let _ = self.jobs.mark_dead(&job_id, &e.to_string()).await;
                return;
            }
        };

        let sender = self.senders.for_kind(&integration.kind);
        let correlation_id = new_correlation_id();
        let attempt = job.attempt + 1;

        match sender.send(&job, &integration, &correlation_id).await {
            Ok(_response) => {
                if let Err(e) = self.jobs.mark_succeeded(&job_id).await {
                    warn!(job = job_id.as_str(), error = %e, "failed to record delivery success");
                }
                info!(job = job_id.as_str(), %correlation_id, "delivery succeeded");
            }
            Err(err) => {
                if attempt >= self.config.max_attempts {
                    warn!(job = job_id.as_str(), attempt, error = %err, "delivery exhausted retries, marking dead");
                    if let Err(e) = self.jobs.mark_dead(&job_id, &err.to_string()).await {
                        warn!(job = job_id.as_str(), error = %e, "failed to mark job dead");
                    }
                    return;
                }
                let jitter = jitter_for(job_id.as_str(), attempt, self.config.base_backoff);
                let delay = backoff_delay(attempt, self.config.base_backoff, self.config.max_backoff, jitter);
                let next_attempt_at = Utc::now() + chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::seconds(1));
                warn!(job = job_id.as_str(), attempt, error = %err, delay_ms = delay.as_millis() as u64, "delivery failed, retrying");
                if let Err(e) = self.jobs.mark_retry(&job_id, attempt, next_attempt_at, &err.to_string()).await {
                    warn!(job = job_id.as_str(), error = %e, "failed to record delivery retry");
                }
            }
        }
    }

    /// Revert leases that expired without their worker finishing (crash
    /// recovery), returning the number of jobs reaped.
    pub async fn reap_expired_leases(&self) -> u64 {
        match self.jobs.reap_expired_leases(Utc::now()).await {
            Ok(n) => {
                if n > 0 {
                    info!(reaped = n, "recovered delivery jobs with expired leases");
                }
                n
            }
            Err(e) => {
                warn!(error = %e, "failed to reap expired delivery leases");
                0
            }
        }
    }

    /// Spawn the periodic claim/dispatch/reap task. No-op if already
    /// started.
    pub fn start(self: &Arc<Self>) {
        let mut control = self.control.lock().expect("delivery worker control mutex poisoned");
        if control.is_some() {
            return;
        }
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let worker = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(worker.config.tick_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = ticker.tick() => {
                        worker.reap_expired_leases().await;
                        worker.tick().await;
                    }
                }
            }
        });
        *control = Some(Control { shutdown: shutdown_tx, handle });
    }

    /// Cancel the periodic task, letting any in-flight dispatch finish.
    pub async fn stop(&self) {
        let control = self.control.lock().expect("delivery worker control mutex poisoned").take();
        if let Some(control) = control {
            let _ = control.shutdown.send(()).await;
            let _ = control.handle.await;
        }
    }
}
