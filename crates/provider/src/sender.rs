use async_trait::async_trait;
use opspulse_core::{DeliveryJob, Integration};

use crate::error::ProviderError;

/// Delivers one [`DeliveryJob`] through a single [`Integration`] kind.
///
/// One implementation per `IntegrationKind` variant (webhook, SNMP, email,
/// MQTT); the delivery worker (C6) picks the sender that matches
/// `integration.kind`'s discriminant rather than consulting a name-keyed
/// registry, since the set of kinds is closed and known at compile time.
///
/// Object-safe by construction (`#[async_trait]`) because the delivery
/// worker holds senders behind `Arc<dyn Sender>`.
#[async_trait]
pub trait Sender: Send + Sync {
    /// Attempt one delivery. `correlation_id` must be carried on the
    /// outbound request (HTTP header for webhook/email/SNMP traps that
    /// support one, a payload field for MQTT) so the far side can tie a
    /// delivery back to the alert that produced it.
    ///
    /// Returns an opaque response payload to store on the job for
    /// diagnostics; the worker does not interpret it further.
    async fn send(
        &self,
        job: &DeliveryJob,
        integration: &Integration,
        correlation_id: &str,
    ) -> Result<serde_json::Value, ProviderError>;
}
