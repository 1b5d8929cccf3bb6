//! HTTP client for the OpsConductor-Pulse admin API.
//!
//! A native Rust client for the ingest health check and `/admin/v1` surface,
//! embedded directly in the CLI rather than split into separate `ops`/`client`
//! crates since the CLI is this domain's only consumer.

use std::time::Duration;

use opspulse_core::{Alert, DeliveryJob, QuarantineEvent};
use reqwest::Client;
use serde::Deserialize;

pub use crate::error::Error;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for a pulse ingest server's health and admin endpoints.
#[derive(Debug, Clone)]
pub struct PulseClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

/// Builder for configuring a [`PulseClient`].
#[derive(Debug)]
pub struct PulseClientBuilder {
    base_url: String,
    timeout: Duration,
    api_key: Option<String>,
}

impl PulseClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            api_key: None,
        }
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn build(self) -> Result<PulseClient, Error> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::Connection(e.to_string()))?;

        Ok(PulseClient {
            client,
            base_url: self.base_url,
            api_key: self.api_key,
        })
    }
}

impl PulseClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        PulseClientBuilder::new(base_url)
            .build()
            .expect("default client configuration should not fail")
    }

    pub fn builder(base_url: impl Into<String>) -> PulseClientBuilder {
        PulseClientBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn add_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("x-admin-api-key", key),
            None => req,
        }
    }

    async fn error_for_status(response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        match response.json::<ErrorBody>().await {
            Ok(body) => Error::Http {
                status,
                message: body.error,
            },
            Err(_) => Error::HttpUnparsed { status },
        }
    }

    /// `GET /health`.
    pub async fn health(&self) -> Result<bool, Error> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(response.status().is_success())
    }

    /// `GET /admin/v1/tenant/{tenant_id}/quarantine`.
    pub async fn list_quarantine(&self, tenant_id: &str) -> Result<Vec<QuarantineEvent>, Error> {
        let url = format!("{}/admin/v1/tenant/{tenant_id}/quarantine", self.base_url);
        let response = self
            .add_auth(self.client.get(&url))
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        if response.status().is_success() {
            response
                .json::<Vec<QuarantineEvent>>()
                .await
                .map_err(|e| Error::Deserialization(e.to_string()))
        } else {
            Err(Self::error_for_status(response).await)
        }
    }

    /// `GET /admin/v1/tenant/{tenant_id}/alerts`.
    pub async fn list_alerts(&self, tenant_id: &str) -> Result<Vec<Alert>, Error> {
        let url = format!("{}/admin/v1/tenant/{tenant_id}/alerts", self.base_url);
        let response = self
            .add_auth(self.client.get(&url))
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        if response.status().is_success() {
            response
                .json::<Vec<Alert>>()
                .await
                .map_err(|e| Error::Deserialization(e.to_string()))
        } else {
            Err(Self::error_for_status(response).await)
        }
    }

    /// `GET /admin/v1/tenant/{tenant_id}/jobs/dead`.
    pub async fn list_dead_jobs(&self, tenant_id: &str) -> Result<Vec<DeliveryJob>, Error> {
        let url = format!("{}/admin/v1/tenant/{tenant_id}/jobs/dead", self.base_url);
        let response = self
            .add_auth(self.client.get(&url))
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        if response.status().is_success() {
            response
                .json::<Vec<DeliveryJob>>()
                .await
                .map_err(|e| Error::Deserialization(e.to_string()))
        } else {
            Err(Self::error_for_status(response).await)
        }
    }

    /// `POST /admin/v1/tenant/{tenant_id}/jobs/{job_id}/requeue`.
    pub async fn requeue_job(&self, tenant_id: &str, job_id: &str) -> Result<(), Error> {
        let url = format!(
            "{}/admin/v1/tenant/{tenant_id}/jobs/{job_id}/requeue",
            self.base_url
        );
        let response = self
            .add_auth(self.client.post(&url))
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_for_status(response).await)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_trims_trailing_slash() {
        let client = PulseClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn client_preserves_url_without_slash() {
        let client = PulseClient::new("http://localhost:8080");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn builder_sets_api_key() {
        let client = PulseClientBuilder::new("http://localhost:8080")
            .api_key("test-key")
            .build()
            .unwrap();
        assert_eq!(client.api_key, Some("test-key".to_string()));
    }
}
