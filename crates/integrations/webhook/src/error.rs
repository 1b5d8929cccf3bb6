use opspulse_provider::ProviderError;
use thiserror::Error;

/// Errors specific to the webhook sender.
///
/// Internal errors that get converted into [`ProviderError`] at the public
/// API boundary.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// An HTTP-level transport error occurred.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote endpoint returned an unexpected status code.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The alert payload could not be serialized for the request body.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The endpoint returned HTTP 429 (Too Many Requests).
    #[error("rate limited by remote endpoint")]
    RateLimited,

    /// HMAC signature computation failed.
    #[error("HMAC signing error: {0}")]
    SigningError(String),
}

impl From<WebhookError> for ProviderError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::Http(e) => {
                if e.is_timeout() {
                    ProviderError::Timeout(std::time::Duration::from_secs(0))
                } else {
                    ProviderError::Connection(e.to_string())
                }
            }
            WebhookError::UnexpectedStatus { status, body } => {
                if status == 429 {
                    ProviderError::RateLimited
                } else if (500..600).contains(&status) {
                    ProviderError::Connection(format!("HTTP {status}: {body}"))
                } else {
                    ProviderError::ExecutionFailed(format!("HTTP {status}: {body}"))
                }
            }
            WebhookError::InvalidPayload(msg) => ProviderError::Serialization(msg),
            WebhookError::RateLimited => ProviderError::RateLimited,
            WebhookError::SigningError(msg) => ProviderError::Configuration(msg),
        }
    }
}
