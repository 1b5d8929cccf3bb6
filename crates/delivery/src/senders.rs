use std::sync::Arc;

use opspulse_core::IntegrationKind;
use opspulse_provider::Sender;

/// Picks the [`Sender`] for an [`IntegrationKind`] discriminant.
///
/// The kind set is closed (spec.md §3 enumerates exactly four), so this is
/// a match rather than a name-keyed registry — see
/// `opspulse-provider::sender` for the rationale.
pub struct SenderRegistry {
    webhook: Arc<dyn Sender>,
    email: Arc<dyn Sender>,
    snmp: Arc<dyn Sender>,
    mqtt: Arc<dyn Sender>,
}

impl SenderRegistry {
    #[must_use]
    pub fn new(webhook: Arc<dyn Sender>, email: Arc<dyn Sender>, snmp: Arc<dyn Sender>, mqtt: Arc<dyn Sender>) -> Self {
        Self { webhook, email, snmp, mqtt }
    }

    #[must_use]
    pub fn for_kind(&self, kind: &IntegrationKind) -> Arc<dyn Sender> {
        match kind {
            IntegrationKind::Webhook { .. } => Arc::clone(&self.webhook),
            IntegrationKind::Email { .. } => Arc::clone(&self.email),
            IntegrationKind::Snmp { .. } => Arc::clone(&self.snmp),
            IntegrationKind::Mqtt { .. } => Arc::clone(&self.mqtt),
        }
    }
}

impl Default for SenderRegistry {
    fn default() -> Self {
        Self::new(
            Arc::new(opspulse_webhook::WebhookSender::new(opspulse_webhook::WebhookSenderConfig::default())),
            Arc::new(opspulse_email::EmailSender::new(opspulse_email::EmailSenderConfig::default())),
            Arc::new(opspulse_snmp::SnmpSender::default()),
            Arc::new(opspulse_mqtt::MqttSender::default()),
        )
    }
}
