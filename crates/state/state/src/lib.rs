pub mod alert;
pub mod device_state;
pub mod error;
pub mod job;
pub mod registry;
pub mod route;
pub mod rule;
pub mod telemetry;

pub use alert::{AlertStore, OpenOutcome};
pub use device_state::DeviceStateStore;
pub use error::StateError;
pub use job::DeliveryJobStore;
pub use registry::DeviceRegistryStore;
pub use route::RouteStore;
pub use rule::AlertRuleStore;
pub use telemetry::{LatestSample, LatestSampleStore};
