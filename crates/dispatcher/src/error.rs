use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatcherError {
    #[error("state backend error: {0}")]
    State(#[from] opspulse_state::StateError),
    #[error("invalid device selector {selector:?} on route {route_id}: {source}")]
    BadSelector {
        route_id: String,
        selector: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid payload template on route {route_id}: {source}")]
    BadTemplate {
        route_id: String,
        #[source]
        source: minijinja::Error,
    },
}
