//! C5: turns open alerts into delivery jobs by matching them against
//! tenant routing rules, applying throttle, and rendering a per-route
//! payload template.

pub mod config;
mod dispatcher;
pub mod error;
pub mod matching;
pub mod payload;
pub mod tenants;
mod tests;

pub use config::DispatcherConfig;
pub use dispatcher::Dispatcher;
pub use error::DispatcherError;
pub use tenants::{StaticTenantSource, TenantSource};
