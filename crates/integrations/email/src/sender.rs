use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use opspulse_core::{DeliveryJob, Integration, IntegrationKind};
use opspulse_provider::{ensure_allowed_host, ProviderError, Sender};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::config::EmailSenderConfig;

/// Alert payload shape produced by the dispatcher's email route template.
#[derive(Debug, Deserialize)]
struct EmailPayload {
    subject: String,
    body: String,
    #[serde(default)]
    html_body: Option<String>,
}

/// Delivers alerts via SMTP, per spec: optional STARTTLS, address-guarded
/// host, recipient list validation.
pub struct EmailSender {
    config: EmailSenderConfig,
}

impl EmailSender {
    pub fn new(config: EmailSenderConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Sender for EmailSender {
    #[instrument(skip(self, job, integration), fields(job_id = %job.job_id, tenant = %job.tenant_id))]
    async fn send(
        &self,
        job: &DeliveryJob,
        integration: &Integration,
        correlation_id: &str,
    ) -> Result<serde_json::Value, ProviderError> {
        let (smtp_host, smtp_port, starttls, recipients) = match &integration.kind {
            IntegrationKind::Email { smtp_host, smtp_port, starttls, recipients } => {
                (smtp_host, *smtp_port, *starttls, recipients)
            }
            other => {
                return Err(ProviderError::Configuration(format!(
                    "email sender received a non-email integration kind: {other:?}"
                )))
            }
        };
        if recipients.is_empty() {
            return Err(ProviderError::Configuration("email route has no recipients".into()));
        }

        ensure_allowed_host(smtp_host, self.config.allow_private).await?;

        let payload: EmailPayload = serde_json::from_value(job.payload.clone())
            .map_err(|e| ProviderError::Serialization(e.to_string()))?;

        let message = build_message(&self.config.from_address, recipients, &payload, correlation_id)?;
        let transport = build_transport(&self.config, smtp_host, smtp_port, starttls)?;

        debug!(smtp_host, smtp_port, recipients = recipients.len(), "sending email delivery");
        transport.send(message).await.map_err(map_smtp_error)?;
        info!("email delivered");

        Ok(serde_json::json!({"recipients": recipients, "subject": payload.subject}))
    }
}

fn build_message(
    from: &str,
    recipients: &[String],
    payload: &EmailPayload,
    correlation_id: &str,
) -> Result<Message, ProviderError> {
    let from_mailbox: Mailbox = from
        .parse()
        .map_err(|e| ProviderError::Configuration(format!("invalid from address: {e}")))?;

    let mut builder = Message::builder().from(from_mailbox).subject(&payload.subject);

    for recipient in recipients {
        let mailbox: Mailbox = recipient
            .parse()
            .map_err(|e| ProviderError::ExecutionFailed(format!("invalid recipient {recipient}: {e}")))?;
        builder = builder.to(mailbox);
    }

    // SMTP has no standard header slot for an arbitrary correlation id, so it
    // rides in the body instead of being dropped on the floor.
    let body = format!("{}\n\n(correlation-id: {correlation_id})", payload.body);

    let message = match &payload.html_body {
        Some(html) => builder
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(lettre::message::header::ContentType::TEXT_PLAIN)
                            .body(body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(lettre::message::header::ContentType::TEXT_HTML)
                            .body(html.clone()),
                    ),
            )
            .map_err(|e| ProviderError::ExecutionFailed(format!("failed to build email: {e}")))?,
        None => builder
            .body(body)
            .map_err(|e| ProviderError::ExecutionFailed(format!("failed to build email: {e}")))?,
    };
    Ok(message)
}

fn build_transport(
    config: &EmailSenderConfig,
    smtp_host: &str,
    smtp_port: u16,
    starttls: bool,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, ProviderError> {
    let builder = if starttls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)
            .map_err(|e| ProviderError::Configuration(format!("SMTP TLS relay error: {e}")))?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp_host)
    };
    let builder = builder.port(smtp_port).timeout(Some(config.timeout));
    let builder = if let (Some(user), Some(pass)) = (&config.username, &config.password) {
        builder.credentials(Credentials::new(user.clone(), pass.clone()))
    } else {
        builder
    };
    Ok(builder.build())
}

fn map_smtp_error(error: lettre::transport::smtp::Error) -> ProviderError {
    let message = error.to_string();
    if error.is_transient() {
        ProviderError::Connection(format!("transient SMTP error: {message}"))
    } else if error.is_permanent() {
        ProviderError::ExecutionFailed(format!("permanent SMTP error: {message}"))
    } else {
        ProviderError::Connection(format!("SMTP error: {message}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_message_plain_text_with_single_recipient() {
        let payload = EmailPayload { subject: "Alert".into(), body: "device offline".into(), html_body: None };
        let message = build_message("alerts@opsconductor.local", &["oncall@example.com".into()], &payload, "corr-1");
        assert!(message.is_ok());
    }

    #[test]
    fn build_message_rejects_invalid_recipient() {
        let payload = EmailPayload { subject: "Alert".into(), body: "x".into(), html_body: None };
        let err = build_message("alerts@opsconductor.local", &["not-an-email".into()], &payload, "corr-1").unwrap_err();
        assert!(matches!(err, ProviderError::ExecutionFailed(_)));
    }

    #[test]
    fn build_message_multipart_with_html() {
        let payload = EmailPayload {
            subject: "Alert".into(),
            body: "plain".into(),
            html_body: Some("<p>plain</p>".into()),
        };
        let message = build_message("alerts@opsconductor.local", &["oncall@example.com".into()], &payload, "corr-1");
        assert!(message.is_ok());
    }

    #[tokio::test]
    async fn rejects_email_route_with_no_recipients() {
        let sender = EmailSender::new(EmailSenderConfig { allow_private: true, ..Default::default() });
        let integration = opspulse_core::Integration {
            tenant_id: opspulse_core::TenantId::new("t1"),
            integration_id: opspulse_core::IntegrationId::new("i1"),
            kind: IntegrationKind::Email {
                smtp_host: "localhost".into(),
                smtp_port: 2525,
                starttls: false,
                recipients: vec![],
            },
        };
        let job = DeliveryJob {
            tenant_id: opspulse_core::TenantId::new("t1"),
            job_id: opspulse_core::JobId::new("j1"),
            alert_id: opspulse_core::AlertId::new("a1"),
            route_id: opspulse_core::RouteId::new("r1"),
            attempt: 0,
            next_attempt_at: chrono::Utc::now(),
            state: opspulse_core::JobState::Pending,
            last_error: None,
            payload: serde_json::json!({"subject": "x", "body": "y"}),
            lease: None,
        };
        let err = sender.send(&job, &integration, "corr-1").await.unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }
}
