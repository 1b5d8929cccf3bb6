/// Process-wide email sender settings. Per-destination settings (SMTP host,
/// port, STARTTLS, recipients) live on `opspulse_core::IntegrationKind::Email`
/// since they vary per tenant route; credentials for the shared relay and
/// the `From` address are operator-level configuration instead.
#[derive(Clone)]
pub struct EmailSenderConfig {
    pub from_address: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: std::time::Duration,
    /// Bypasses the outbound address guard. Only ever `true` in tests.
    pub allow_private: bool,
}

impl std::fmt::Debug for EmailSenderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailSenderConfig")
            .field("from_address", &self.from_address)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("allow_private", &self.allow_private)
            .finish()
    }
}

impl Default for EmailSenderConfig {
    fn default() -> Self {
        Self {
            from_address: "alerts@opsconductor.local".to_owned(),
            username: None,
            password: None,
            timeout: std::time::Duration::from_secs(10),
            allow_private: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_password() {
        let config = EmailSenderConfig { password: Some("secret".into()), ..Default::default() };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("REDACTED"));
    }
}
