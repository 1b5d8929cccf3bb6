use async_trait::async_trait;
use opspulse_core::TenantId;

use crate::error::WriterError;

/// Destination for a flushed batch of line-protocol lines, joined by `\n`.
///
/// One call per tenant per flush (spec.md §4.2: "a flush emits one write per
/// tenant"). Implementations must be safe to call concurrently across
/// tenants.
#[async_trait]
pub trait LineSink: Send + Sync {
    async fn write_batch(&self, tenant_id: &TenantId, body: &str) -> Result<(), WriterError>;
}

/// Writes batches to a time-series store's HTTP line-protocol write endpoint,
/// one tenant per URL path segment.
pub struct HttpLineSink {
    client: reqwest::Client,
    endpoint_base: String,
}

impl HttpLineSink {
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint_base: impl Into<String>) -> Self {
        Self {
            client,
            endpoint_base: endpoint_base.into(),
        }
    }
}

#[async_trait]
impl LineSink for HttpLineSink {
    async fn write_batch(&self, tenant_id: &TenantId, body: &str) -> Result<(), WriterError> {
        let url = format!("{}/write?tenant={}", self.endpoint_base, tenant_id.as_str());
        let response = self
            .client
            .post(url)
            .header("content-type", "text/plain; charset=utf-8")
            .body(body.to_owned())
            .send()
            .await
            .map_err(|e| WriterError::Sink(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(WriterError::Sink(format!("status {}", response.status())))
        }
    }
}
