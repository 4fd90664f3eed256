use anyhow::{Context, Result};
use async_trait::async_trait;
use blockclock_rust_core::{Notifier, NotifyError};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

use crate::config::SmtpSettings;

/// Port that speaks TLS from the first byte; everything else upgrades via STARTTLS
const IMPLICIT_TLS_PORT: u16 = 465;

/// Sends HTML alert e-mails through an authenticated SMTP relay
pub struct EmailClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailClient {
    pub fn new(settings: &SmtpSettings, timeout: Duration) -> Result<Self> {
        let from: Mailbox = settings
            .user
            .parse()
            .with_context(|| format!("smtp_user is not a valid sender address: {}", settings.user))?;

        let builder = if settings.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.server)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)
        }
        .with_context(|| format!("Failed to configure SMTP relay {}", settings.server))?;

        let transport = builder
            .port(settings.port)
            .credentials(Credentials::new(
                settings.user.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(timeout))
            .build();

        Ok(Self { transport, from })
    }

    fn build_message(&self, body: &str, subject: &str, recipient: &str) -> Result<Message, NotifyError> {
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| NotifyError::Address(format!("{recipient}: {e}")))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| NotifyError::Message(e.to_string()))
    }
}

#[async_trait]
impl Notifier for EmailClient {
    async fn send(&self, body: &str, subject: &str, recipient: &str) -> Result<(), NotifyError> {
        let message = self.build_message(body, subject, recipient)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(port: u16) -> SmtpSettings {
        SmtpSettings {
            server: "smtp.example.com".to_string(),
            port,
            user: "ticker@example.com".to_string(),
            password: "secret".to_string(),
            notify_address: "me@example.com".to_string(),
        }
    }

    #[test]
    fn test_build_message() {
        let client = EmailClient::new(&settings(587), Duration::from_secs(10)).unwrap();
        let message = client
            .build_message("USD 150.000000<br>", "ALERT - ETH", "me@example.com")
            .unwrap();

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: ALERT - ETH"));
        assert!(raw.contains("From: ticker@example.com"));
        assert!(raw.contains("To: me@example.com"));
        assert!(raw.contains("text/html"));
        assert!(raw.contains("USD 150.000000<br>"));
    }

    #[test]
    fn test_bad_recipient() {
        let client = EmailClient::new(&settings(465), Duration::from_secs(10)).unwrap();
        let err = client
            .build_message("body", "ALERT - ETH", "not an address")
            .unwrap_err();
        assert!(matches!(err, NotifyError::Address(_)));
    }

    #[test]
    fn test_bad_sender() {
        let mut bad = settings(587);
        bad.user = "ticker".to_string();
        assert!(EmailClient::new(&bad, Duration::from_secs(10)).is_err());
    }
}
