//! C3 ingestion workers: auth/policy validation, line-protocol encoding, and
//! handoff to the batch writer and device-state/latest-sample stores.

pub mod config;
pub mod message;
pub mod pipeline;
pub mod quarantine;
pub mod ratelimit;
pub mod stats;
pub mod validate;

pub use config::IngestConfig;
pub use message::{parse_raw, salvage_identity, InboundMessage, MsgType};
pub use pipeline::{IngestDeps, IngestPipeline, QueueFullError};
pub use quarantine::{InMemoryQuarantineSink, QuarantineSink, TracingQuarantineSink};
pub use ratelimit::RateLimiter;
pub use stats::IngestStats;
pub use validate::{precheck_auth, validate_message, ValidateFailure, ValidatedMessage};
