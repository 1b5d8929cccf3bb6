use std::sync::Arc;
use std::sync::Mutex;

use chrono::Utc;
use opspulse_core::{DeliveryJob, JobId, JobState};
use opspulse_state::{AlertStore, DeliveryJobStore, DeviceRegistryStore, RouteStore};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::DispatcherConfig;
use crate::error::DispatcherError;
use crate::matching::route_matches;
use crate::payload::render_payload;
use crate::tenants::TenantSource;

struct Control {
    shutdown: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// The dispatcher process (C5): reacts to open alerts by turning matching
/// routes into delivery jobs.
///
/// Implemented as a polling loop, one of the two polymorphic shapes spec.md
/// §4.5 allows ("polling loop over recent alerts or driven by a change
/// notification from the alert store — both are valid, the contract is
/// identical"). Idempotent: throttle plus fingerprint suppress duplicate
/// jobs when the same tick (or an overlapping one) sees the same alert
/// twice.
pub struct Dispatcher {
    config: DispatcherConfig,
    tenants: Arc<dyn TenantSource>,
    routes: Arc<dyn RouteStore>,
    alerts: Arc<dyn AlertStore>,
    registry: Arc<dyn DeviceRegistryStore>,
    jobs: Arc<dyn DeliveryJobStore>,
    control: Mutex<Option<Control>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        config: DispatcherConfig,
        tenants: Arc<dyn TenantSource>,
        routes: Arc<dyn RouteStore>,
        alerts: Arc<dyn AlertStore>,
        registry: Arc<dyn DeviceRegistryStore>,
        jobs: Arc<dyn DeliveryJobStore>,
    ) -> Arc<Self> {
        Arc::new(Self { config, tenants, routes, alerts, registry, jobs, control: Mutex::new(None) })
    }

    /// Run one tick across every active tenant.
    pub async fn tick(&self) {
        for tenant_id in self.tenants.active_tenants().await {
            if let Err(e) = self.tick_tenant(&tenant_id).await {
                warn!(tenant = tenant_id.as_str(), error = %e, "dispatcher tick failed");
            }
        }
    }

    async fn tick_tenant(&self, tenant_id: &opspulse_core::TenantId) -> Result<(), DispatcherError> {
        let open_alerts = self.alerts.list_open(tenant_id).await?;
        if open_alerts.is_empty() {
            return Ok(());
        }
        let routes = self.routes.list_enabled_routes(tenant_id).await?;
        let now = Utc::now();

        for alert in &open_alerts {
            for route in &routes {
                if !route_matches(route, alert, self.registry.as_ref()).await? {
                    continue;
                }

                if let Some(throttle) = route.throttle_seconds {
                    if let Some(last) = self
                        .routes
                        .last_dispatched_at(tenant_id, &route.route_id, &alert.fingerprint)
                        .await?
                    {
                        let elapsed = (now - last).num_seconds().max(0) as u64;
                        if elapsed < throttle {
                            continue;
                        }
                    }
                }

                let payload = render_payload(route, alert)?;
                let job = DeliveryJob {
                    job_id: JobId::new(uuid::Uuid::now_v7().to_string()),
                    tenant_id: tenant_id.clone(),
                    alert_id: alert.alert_id.clone(),
                    route_id: route.route_id.clone(),
                    attempt: 0,
                    next_attempt_at: now,
                    state: JobState::Pending,
                    last_error: None,
                    payload,
                    lease: None,
                };
                self.jobs.insert(job).await?;
                self.routes.record_dispatch(tenant_id, &route.route_id, &alert.fingerprint, now).await?;
                info!(
                    tenant = tenant_id.as_str(),
                    alert = alert.alert_id.as_str(),
                    route = route.route_id.as_str(),
                    "delivery job created"
                );
            }
        }
        Ok(())
    }

    /// Spawn the periodic tick task. No-op if already started.
    pub fn start(self: &Arc<Self>) {
        let mut control = self.control.lock().expect("dispatcher control mutex poisoned");
        if control.is_some() {
            return;
        }
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let dispatcher = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(dispatcher.config.tick_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = ticker.tick() => {
                        dispatcher.tick().await;
                    }
                }
            }
        });
        *control = Some(Control { shutdown: shutdown_tx, handle });
    }

    /// Cancel the periodic tick task.
    pub async fn stop(&self) {
        let control = self.control.lock().expect("dispatcher control mutex poisoned").take();
        if let Some(control) = control {
            let _ = control.shutdown.send(()).await;
            let _ = control.handle.await;
        }
    }
}
