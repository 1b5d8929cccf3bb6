use async_trait::async_trait;
use hmac::{Hmac, Mac};
use opspulse_core::{DeliveryJob, Integration, IntegrationKind};
use opspulse_provider::{ensure_allowed_host, ProviderError, Sender, CORRELATION_HEADER};
use reqwest::Url;
use sha2::Sha256;
use tracing::{debug, info, instrument};

use crate::config::WebhookSenderConfig;
use crate::error::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Delivers alerts to arbitrary HTTP endpoints, per spec: POST JSON body,
/// optional `X-Signature-256: sha256=<hex>` HMAC header, 10s default
/// timeout, success is `200 <= status < 300`.
pub struct WebhookSender {
    config: WebhookSenderConfig,
    client: reqwest::Client,
}

impl WebhookSender {
    pub fn new(config: WebhookSenderConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("reqwest client builder should not fail with this configuration");
        Self { config, client }
    }

    pub fn with_client(config: WebhookSenderConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

fn compute_hmac(secret: &str, body: &[u8]) -> Result<String, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| WebhookError::SigningError(e.to_string()))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[async_trait]
impl Sender for WebhookSender {
    #[instrument(skip(self, job, integration), fields(job_id = %job.job_id, tenant = %job.tenant_id))]
    async fn send(
        &self,
        job: &DeliveryJob,
        integration: &Integration,
        correlation_id: &str,
    ) -> Result<serde_json::Value, ProviderError> {
        let (url, hmac_secret) = match &integration.kind {
            IntegrationKind::Webhook { url, hmac_secret } => (url, hmac_secret),
            other => {
                return Err(ProviderError::Configuration(format!(
                    "webhook sender received a non-webhook integration kind: {other:?}"
                )))
            }
        };

        let parsed = Url::parse(url)
            .map_err(|e| ProviderError::Configuration(format!("invalid webhook url: {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ProviderError::Configuration("webhook url has no host".into()))?;
        ensure_allowed_host(host, self.config.allow_private).await?;

        let body = serde_json::to_vec(&job.payload)
            .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

        let mut request = self
            .client
            .post(url.as_str())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(CORRELATION_HEADER, correlation_id)
            .body(body.clone());

        if let Some(secret) = hmac_secret {
            let signature = compute_hmac(secret, &body)?;
            request = request.header("X-Signature-256", format!("sha256={signature}"));
        }

        debug!(url = %parsed, "sending webhook delivery");
        let response = request.send().await.map_err(WebhookError::Http)?;
        let status = response.status();

        if status.as_u16() == 429 {
            return Err(WebhookError::RateLimited.into());
        }
        if !(200..300).contains(&status.as_u16()) {
            let body = response.text().await.unwrap_or_default();
            return Err(WebhookError::UnexpectedStatus { status: status.as_u16(), body }.into());
        }

        let text = response.text().await.map_err(WebhookError::Http)?;
        let parsed_body = serde_json::from_str(&text).unwrap_or_else(|_| serde_json::json!({"raw": text}));
        info!(status = status.as_u16(), "webhook delivered");
        Ok(serde_json::json!({"status": status.as_u16(), "body": parsed_body}))
    }
}
