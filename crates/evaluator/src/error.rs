use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("state backend error: {0}")]
    State(#[from] opspulse_state::StateError),
    #[error("invalid device selector {selector:?} on rule {rule_id}: {source}")]
    BadSelector {
        rule_id: String,
        selector: String,
        #[source]
        source: regex::Error,
    },
}
