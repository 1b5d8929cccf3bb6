use std::time::Duration;

/// Process-wide webhook sender settings; per-destination settings (URL, HMAC
/// secret) live on `opspulse_core::IntegrationKind::Webhook` instead, since
/// every tenant's webhook route shares the same timeout and address policy.
#[derive(Debug, Clone)]
pub struct WebhookSenderConfig {
    pub timeout: Duration,
    /// Bypasses the outbound address guard. Only ever `true` in tests.
    pub allow_private: bool,
}

impl Default for WebhookSenderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            allow_private: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_matches_spec() {
        assert_eq!(WebhookSenderConfig::default().timeout, Duration::from_secs(10));
    }
}
