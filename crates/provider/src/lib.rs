//! Delivery sender trait, outbound address guard, and correlation ID
//! minting shared by every integration crate (webhook, email, SNMP, MQTT).

pub mod correlation;
pub mod error;
pub mod guard;
pub mod sender;

pub use correlation::{new_correlation_id, CORRELATION_FIELD, CORRELATION_HEADER};
pub use error::ProviderError;
pub use guard::ensure_allowed_host;
pub use sender::Sender;
