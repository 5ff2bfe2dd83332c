//! Email senders

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;
use tracing::{error, info};

use crate::config::SmtpConfig;

/// Errors raised while sending email
#[derive(Error, Debug)]
pub enum EmailError {
    /// No SMTP credentials were configured
    #[error("Email sending is not configured")]
    NotConfigured,

    /// An `SMTP_*` setting has an unusable value
    #[error("Invalid SMTP configuration: {0}")]
    InvalidConfig(String),

    /// A sender or recipient address could not be parsed
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The message could not be assembled
    #[error("Failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    /// The SMTP exchange failed
    #[error("SMTP error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// A single message ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    /// Plain-text body
    pub text: String,
    /// HTML alternative; the plain text is sent alone when absent
    pub html: Option<String>,
}

/// Delivers outgoing email
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError>;
}

/// Sender used when SMTP is not configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSender;

#[async_trait]
impl EmailSender for DisabledSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        info!("Skipping email (no SMTP configured): {}", email.subject);
        Err(EmailError::NotConfigured)
    }
}

/// SMTP sender over an async lettre transport
#[derive(Clone)]
pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpSender {
    /// Must be called from within a Tokio runtime.
    pub fn new(config: SmtpConfig) -> Result<Self, EmailError> {
        let from = Mailbox::new(Some(config.from_name.clone()), config.from_address.parse()?);

        let builder = if config.implicit_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        };

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        info!("SMTP configured with {}:{}", config.host, config.port);
        Ok(Self { transport, from })
    }

    fn build_message(&self, email: &OutgoingEmail) -> Result<Message, EmailError> {
        let to: Mailbox = email.to.parse()?;
        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone());

        let message = match &email.html {
            Some(html) => {
                builder.multipart(MultiPart::alternative_plain_html(email.text.clone(), html.clone()))?
            }
            None => builder.body(email.text.clone())?,
        };

        Ok(message)
    }
}

#[async_trait]
impl EmailSender for SmtpSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let message = self.build_message(email)?;

        match self.transport.send(message).await {
            Ok(_) => {
                info!("Sent to {}: {}", email.to, email.subject);
                Ok(())
            }
            Err(e) => {
                error!("Failed to send to {}: {}", email.to, e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "localhost".to_string(),
            port: 465,
            username: "robot".to_string(),
            password: "secret".to_string(),
            from_address: "robot@example.com".to_string(),
            from_name: "Daily Check-In".to_string(),
        }
    }

    fn email(to: &str) -> OutgoingEmail {
        OutgoingEmail {
            to: to.to_string(),
            subject: "Hello".to_string(),
            text: "plain".to_string(),
            html: Some("<p>rich</p>".to_string()),
        }
    }

    #[tokio::test]
    async fn test_disabled_sender_reports_failure() {
        let result = DisabledSender.send(&email("a@example.com")).await;
        assert!(matches!(result, Err(EmailError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_build_message_sets_headers() {
        let sender = SmtpSender::new(config()).unwrap();
        let message = sender.build_message(&email("friend@example.com")).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("To: friend@example.com"));
        assert!(raw.contains("Subject: Hello"));
        assert!(raw.contains("robot@example.com"));
        assert!(raw.contains("multipart/alternative"));
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_rejected() {
        let sender = SmtpSender::new(config()).unwrap();
        let result = sender.build_message(&email("not an address"));
        assert!(matches!(result, Err(EmailError::Address(_))));
    }

    #[tokio::test]
    async fn test_invalid_sender_address_is_rejected() {
        let mut config = config();
        config.from_address = "nope".to_string();
        assert!(matches!(SmtpSender::new(config), Err(EmailError::Address(_))));
    }
}
