//! C4: device liveness state machine and threshold rule tick loop, sharing
//! one periodic process because both read/write the same alert store and
//! must agree on "now" for a given tick.

pub mod config;
pub mod error;
mod evaluator;
pub mod liveness;
pub mod rules_tick;
pub mod tenants;
mod tests;

pub use config::EvaluatorConfig;
pub use error::EvaluatorError;
pub use evaluator::Evaluator;
pub use liveness::{classify, tick_liveness};
pub use rules_tick::tick_rules;
pub use tenants::{StaticTenantSource, TenantSource};
