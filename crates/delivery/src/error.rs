use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("state backend error: {0}")]
    State(#[from] opspulse_state::StateError),
    #[error("route {0} no longer exists")]
    RouteNotFound(String),
    #[error("integration {0} no longer exists")]
    IntegrationNotFound(String),
}
