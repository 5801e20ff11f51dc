//! Mail Delivery
//!
//! Outgoing mail goes through [`MailSender`]. Production uses SMTP via
//! lettre; development prints messages to the log; tests keep them in memory.

use std::sync::Arc;

use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::sync::Mutex;

/// A plain-text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: vec![to.into()],
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Mail delivery error
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Could not build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("Message has no recipients")]
    NoRecipients,
    #[error("Mail relay unreachable")]
    Unreachable,
}

#[trait_variant::make(MailSender: Send)]
pub trait LocalMailSender {
    /// Deliver a message or report why it could not be delivered
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

/// SMTP relay settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Upgrade the connection with STARTTLS
    pub starttls: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 25,
            username: None,
            password: None,
            starttls: false,
        }
    }
}

/// SMTP delivery through lettre
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let mut builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        }
        .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn build_message(message: MailMessage) -> Result<Message, MailError> {
    if message.to.is_empty() {
        return Err(MailError::NoRecipients);
    }

    let mut builder = Message::builder()
        .from(message.from.parse::<Mailbox>()?)
        .subject(message.subject)
        .header(ContentType::TEXT_PLAIN);
    for to in &message.to {
        builder = builder.to(to.parse::<Mailbox>()?);
    }
    Ok(builder.body(message.body)?)
}

impl MailSender for SmtpMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let email = build_message(message)?;
        self.transport.send(email).await?;
        Ok(())
    }
}

/// Writes messages to the log instead of sending them
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMailer;

impl MailSender for ConsoleMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        if message.to.is_empty() {
            return Err(MailError::NoRecipients);
        }
        tracing::info!(
            from = %message.from,
            to = ?message.to,
            subject = %message.subject,
            body = %message.body,
            "Mail (console delivery)"
        );
        Ok(())
    }
}

/// Keeps delivered messages for inspection
#[derive(Debug, Clone, Default)]
pub struct MemoryMailer {
    outbox: Arc<Mutex<Vec<MailMessage>>>,
    unreachable: bool,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every message as if the relay were down
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Everything sent so far, oldest first
    pub async fn outbox(&self) -> Vec<MailMessage> {
        self.outbox.lock().await.clone()
    }

    /// Most recent message addressed to `to`
    pub async fn last_to(&self, to: &str) -> Option<MailMessage> {
        self.outbox
            .lock()
            .await
            .iter()
            .rev()
            .find(|m| m.to.iter().any(|t| t == to))
            .cloned()
    }
}

impl MailSender for MemoryMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        if message.to.is_empty() {
            return Err(MailError::NoRecipients);
        }
        if self.unreachable {
            return Err(MailError::Unreachable);
        }
        self.outbox.lock().await.push(message);
        Ok(())
    }
}

/// Mailer selected at startup
#[derive(Clone)]
pub enum Mailer {
    Smtp(SmtpMailer),
    Console(ConsoleMailer),
    Memory(MemoryMailer),
}

impl Mailer {
    /// SMTP when a relay is configured, console otherwise
    pub fn from_config(smtp: Option<&SmtpConfig>) -> Result<Self, MailError> {
        match smtp {
            Some(config) => Ok(Self::Smtp(SmtpMailer::new(config)?)),
            None => Ok(Self::Console(ConsoleMailer)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Smtp(_) => "smtp",
            Self::Console(_) => "console",
            Self::Memory(_) => "memory",
        }
    }
}

impl MailSender for Mailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        match self {
            Self::Smtp(m) => MailSender::send(m, message).await,
            Self::Console(m) => MailSender::send(m, message).await,
            Self::Memory(m) => MailSender::send(m, message).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> MailMessage {
        MailMessage::new(
            "noreply@example.com",
            "alice@example.com",
            "Confirmation code",
            "abc",
        )
    }

    #[test]
    fn test_build_message() {
        assert!(build_message(message()).is_ok());

        let mut bad = message();
        bad.from = "not an address".to_string();
        assert!(matches!(build_message(bad), Err(MailError::Address(_))));

        let mut empty = message();
        empty.to.clear();
        assert!(matches!(build_message(empty), Err(MailError::NoRecipients)));
    }

    #[tokio::test]
    async fn test_memory_mailer_records_messages() {
        let mailer = MemoryMailer::new();
        let shared = Mailer::Memory(mailer.clone());
        MailSender::send(&shared, message()).await.unwrap();

        assert_eq!(mailer.outbox().await.len(), 1);
        assert_eq!(
            mailer.last_to("alice@example.com").await.unwrap().body,
            "abc"
        );
        assert!(mailer.last_to("bob@example.com").await.is_none());
    }

    #[tokio::test]
    async fn test_console_mailer_accepts_messages() {
        assert!(MailSender::send(&ConsoleMailer, message()).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_mailer_rejects_and_keeps_nothing() {
        let mailer = MemoryMailer::unreachable();
        let shared = Mailer::Memory(mailer.clone());
        let result = MailSender::send(&shared, message()).await;

        assert!(matches!(result, Err(MailError::Unreachable)));
        assert!(mailer.outbox().await.is_empty());
    }

    #[test]
    fn test_from_config_without_relay_is_console() {
        assert_eq!(Mailer::from_config(None).unwrap().kind(), "console");
        let smtp = SmtpConfig::default();
        assert_eq!(Mailer::from_config(Some(&smtp)).unwrap().kind(), "smtp");
    }
}
