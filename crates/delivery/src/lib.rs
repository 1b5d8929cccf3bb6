//! C6: claims leased batches of due delivery jobs and dispatches each
//! through the sender matching its destination integration's kind, with
//! exponential backoff retry and a dead-letter terminal state.

pub mod config;
pub mod error;
mod jitter;
mod resolve;
pub mod senders;
mod tests;
mod worker;

pub use config::DeliveryConfig;
pub use error::DeliveryError;
pub use senders::SenderRegistry;
pub use worker::DeliveryWorker;
