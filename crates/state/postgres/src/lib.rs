//! `PostgreSQL`-backed implementations of the `opspulse-state` repository traits.

pub mod alert;
pub mod config;
pub mod device_state;
pub mod job;
pub mod migrations;
pub mod pool;
pub mod registry;
pub mod route;
pub mod rule;
pub mod telemetry;

pub use config::PostgresConfig;
pub use pool::PostgresRepo;
