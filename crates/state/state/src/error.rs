use thiserror::Error;

/// Errors from the persistence layer (device registry, device state, alert
/// rules, alerts, routes, integrations, delivery jobs, latest samples).
#[derive(Debug, Error)]
pub enum StateError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("CAS conflict on job {job_id}: expected state {expected}, found {found}")]
    CasConflict {
        job_id: String,
        expected: String,
        found: String,
    },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
