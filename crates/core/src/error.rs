use thiserror::Error;

use crate::telemetry::QuarantineReason;

/// Domain-level errors shared across the pipeline crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("message rejected: {0:?}")]
    Quarantined(QuarantineReason),

    #[error("contract violation: {0}")]
    ContractViolation(String),

    #[error("invalid device selector {selector:?}: {source}")]
    InvalidSelector {
        selector: String,
        #[source]
        source: regex::Error,
    },
}
