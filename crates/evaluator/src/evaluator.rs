use std::sync::Arc;
use std::sync::Mutex;

use chrono::Utc;
use opspulse_state::{AlertRuleStore, AlertStore, DeviceRegistryStore, DeviceStateStore, LatestSampleStore};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::config::EvaluatorConfig;
use crate::liveness::tick_liveness;
use crate::rules_tick::tick_rules;
use crate::tenants::TenantSource;

struct Control {
    shutdown: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// The evaluator process (C4): one periodic tick loop driving liveness
/// transitions and threshold rule evaluation across every active tenant.
///
/// Restartable with no persisted in-memory state (spec.md §4.4): every tick
/// reads `device_state`/`alerts` fresh rather than caching liveness between
/// ticks, so a process restart or a missed tick cannot desync stored state
/// from the tick loop's view of it.
pub struct Evaluator {
    config: EvaluatorConfig,
    tenants: Arc<dyn TenantSource>,
    device_state: Arc<dyn DeviceStateStore>,
    alerts: Arc<dyn AlertStore>,
    rules: Arc<dyn AlertRuleStore>,
    registry: Arc<dyn DeviceRegistryStore>,
    samples: Arc<dyn LatestSampleStore>,
    control: Mutex<Option<Control>>,
}

impl Evaluator {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: EvaluatorConfig,
        tenants: Arc<dyn TenantSource>,
        device_state: Arc<dyn DeviceStateStore>,
        alerts: Arc<dyn AlertStore>,
        rules: Arc<dyn AlertRuleStore>,
        registry: Arc<dyn DeviceRegistryStore>,
        samples: Arc<dyn LatestSampleStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            tenants,
            device_state,
            alerts,
            rules,
            registry,
            samples,
            control: Mutex::new(None),
        })
    }

    /// Run one tick across every active tenant. Exposed directly for tests
    /// and for callers that want to drive the loop themselves (e.g. a CLI
    /// `tick-once` command) instead of the built-in periodic task.
    pub async fn tick(&self) {
        let now = Utc::now();
        for tenant_id in self.tenants.active_tenants().await {
            if let Err(e) = tick_liveness(&tenant_id, now, &self.config, self.device_state.as_ref(), self.alerts.as_ref()).await {
                warn!(tenant = tenant_id.as_str(), error = %e, "liveness tick failed");
            }
            if let Err(e) = tick_rules(
                &tenant_id,
                now,
                self.rules.as_ref(),
                self.registry.as_ref(),
                self.samples.as_ref(),
                self.alerts.as_ref(),
            )
            .await
            {
                warn!(tenant = tenant_id.as_str(), error = %e, "rule tick failed");
            }
        }
    }

    /// Spawn the periodic tick task. No-op if already started.
    pub fn start(self: &Arc<Self>) {
        let mut control = self.control.lock().expect("evaluator control mutex poisoned");
        if control.is_some() {
            return;
        }
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let evaluator = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(evaluator.config.tick_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = ticker.tick() => {
                        evaluator.tick().await;
                    }
                }
            }
        });
        *control = Some(Control { shutdown: shutdown_tx, handle });
    }

    /// Cancel the periodic tick task.
    pub async fn stop(&self) {
        let control = self.control.lock().expect("evaluator control mutex poisoned").take();
        if let Some(control) = control {
            let _ = control.shutdown.send(()).await;
            let _ = control.handle.await;
        }
    }
}
