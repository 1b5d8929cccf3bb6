use std::time::Duration;

use async_trait::async_trait;
use opspulse_core::{DeliveryJob, Integration, IntegrationKind};
use opspulse_provider::{ensure_allowed_host, ProviderError, Sender, CORRELATION_FIELD};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tracing::{debug, info, instrument};

use crate::topic::render_topic;

/// Delivers alerts over MQTT, per spec: publish with route-configured
/// QoS/retain, topic rendered from the route's template, correlation id
/// carried as a payload field (MQTT has no universal header slot).
pub struct MqttSender {
    connect_timeout: Duration,
}

impl MqttSender {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for MqttSender {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

fn to_qos(qos: u8) -> QoS {
    match qos {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        _ => QoS::ExactlyOnce,
    }
}

#[async_trait]
impl Sender for MqttSender {
    #[instrument(skip(self, job, integration), fields(job_id = %job.job_id, tenant = %job.tenant_id))]
    async fn send(
        &self,
        job: &DeliveryJob,
        integration: &Integration,
        correlation_id: &str,
    ) -> Result<serde_json::Value, ProviderError> {
        let (broker_host, broker_port, topic_template, qos, retain) = match &integration.kind {
            IntegrationKind::Mqtt { broker_host, broker_port, topic_template, qos, retain } => {
                (broker_host, *broker_port, topic_template, *qos, *retain)
            }
            other => {
                return Err(ProviderError::Configuration(format!(
                    "mqtt sender received a non-mqtt integration kind: {other:?}"
                )))
            }
        };

        ensure_allowed_host(broker_host, false).await?;

        let topic = render_topic(topic_template, job);
        let mut payload = job.payload.clone();
        if let Some(map) = payload.as_object_mut() {
            map.insert(CORRELATION_FIELD.to_owned(), serde_json::json!(correlation_id));
        }
        let body = serde_json::to_vec(&payload).map_err(|e| ProviderError::Serialization(e.to_string()))?;

        let client_id = format!("opspulse-delivery-{}", job.job_id.as_str());
        let mut options = MqttOptions::new(client_id, broker_host.clone(), broker_port);
        options.set_keep_alive(Duration::from_secs(5));
        let (client, mut eventloop) = AsyncClient::new(options, 10);

        debug!(broker_host, broker_port, %topic, "publishing MQTT delivery");
        client
            .publish(&topic, to_qos(qos), retain, body)
            .await
            .map_err(|e| ProviderError::Connection(format!("mqtt publish failed: {e}")))?;

        let deadline = tokio::time::Instant::now() + self.connect_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Err(ProviderError::Timeout(self.connect_timeout));
            }
            match tokio::time::timeout(remaining, eventloop.poll()).await {
                Ok(Ok(Event::Incoming(Packet::PubAck(_) | Packet::PubComp(_)))) => break,
                Ok(Ok(Event::Outgoing(_))) if qos == 0 => break,
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => return Err(ProviderError::Connection(format!("mqtt eventloop error: {e}"))),
                Err(_) => return Err(ProviderError::Timeout(self.connect_timeout)),
            }
        }

        client.disconnect().await.ok();
        info!(%topic, "MQTT delivery published");
        Ok(serde_json::json!({"topic": topic, "qos": qos, "retain": retain}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opspulse_core::{AlertId, IntegrationId, JobId, JobState, RouteId, TenantId};

    fn sample_job() -> DeliveryJob {
        DeliveryJob {
            tenant_id: TenantId::new("t1"),
            job_id: JobId::new("j1"),
            alert_id: AlertId::new("a1"),
            route_id: RouteId::new("r1"),
            attempt: 0,
            next_attempt_at: chrono::Utc::now(),
            state: JobState::Pending,
            last_error: None,
            payload: serde_json::json!({"metric": "temp_c"}),
            lease: None,
        }
    }

    #[test]
    fn qos_mapping_matches_mqtt_semantics() {
        assert_eq!(to_qos(0), QoS::AtMostOnce);
        assert_eq!(to_qos(1), QoS::AtLeastOnce);
        assert_eq!(to_qos(2), QoS::ExactlyOnce);
    }

    #[tokio::test]
    async fn rejects_non_mqtt_integration_kind() {
        let sender = MqttSender::default();
        let integration = Integration {
            tenant_id: TenantId::new("t1"),
            integration_id: IntegrationId::new("i1"),
            kind: IntegrationKind::Webhook { url: "https://example.com".into(), hmac_secret: None },
        };
        let job = sample_job();
        let err = sender.send(&job, &integration, "corr-1").await.unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }
}
