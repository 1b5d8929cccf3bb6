use std::sync::Arc;

use opspulse_state::{
    AlertRuleStore, AlertStore, DeliveryJobStore, DeviceRegistryStore, DeviceStateStore,
    LatestSampleStore, RouteStore, StateError,
};
use opspulse_state_memory::MemoryBackend;
use opspulse_state_postgres::{PostgresConfig, PostgresRepo};

/// Every state trait bound to one concrete backend, cloned out to each
/// component that needs it. Both backends are each a single struct
/// implementing all seven traits, so building this is just one
/// construction and seven `Arc` clones (spec.md §4.3-§4.6 each take a
/// `Arc<dyn ...Store>` rather than a concrete backend type).
#[derive(Clone)]
pub struct Backends {
    pub registry: Arc<dyn DeviceRegistryStore>,
    pub device_state: Arc<dyn DeviceStateStore>,
    pub alerts: Arc<dyn AlertStore>,
    pub rules: Arc<dyn AlertRuleStore>,
    pub routes: Arc<dyn RouteStore>,
    pub jobs: Arc<dyn DeliveryJobStore>,
    pub samples: Arc<dyn LatestSampleStore>,
}

impl Backends {
    #[must_use]
    pub fn in_memory() -> Self {
        let backend = Arc::new(MemoryBackend::new());
        Self {
            registry: backend.clone(),
            device_state: backend.clone(),
            alerts: backend.clone(),
            rules: backend.clone(),
            routes: backend.clone(),
            jobs: backend.clone(),
            samples: backend,
        }
    }

    pub async fn postgres(config: PostgresConfig) -> Result<Self, StateError> {
        let repo = Arc::new(PostgresRepo::new(config).await?);
        Ok(Self {
            registry: repo.clone(),
            device_state: repo.clone(),
            alerts: repo.clone(),
            rules: repo.clone(),
            routes: repo.clone(),
            jobs: repo.clone(),
            samples: repo,
        })
    }
}
