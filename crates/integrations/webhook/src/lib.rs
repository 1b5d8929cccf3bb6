//! HTTP webhook delivery sender: POSTs the alert payload as JSON, optionally
//! HMAC-signed, guarded against loopback/private/link-local/metadata hosts.

pub mod config;
pub mod error;
pub mod sender;

pub use config::WebhookSenderConfig;
pub use error::WebhookError;
pub use sender::WebhookSender;
