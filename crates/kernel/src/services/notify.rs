//! Notification delivery using lettre/SMTP.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use crate::config::Config;

/// Outbound notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a plain-text message to every recipient.
    async fn send(&self, subject: &str, body: &str, recipients: &[String]) -> Result<()>;
}

/// Notifier used when no SMTP relay is configured.
#[derive(Debug, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn send(&self, subject: &str, _body: &str, recipients: &[String]) -> Result<()> {
        debug!(subject, recipients = recipients.len(), "notifications disabled, not sending");
        Ok(())
    }
}

/// SMTP notifier.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Create a new SMTP notifier.
    ///
    /// `encryption` controls the SMTP transport mode:
    /// - `"starttls"` (default): Opportunistic STARTTLS on port 587
    /// - `"tls"`: Implicit TLS (SMTPS) on port 465
    /// - `"none"`: Unencrypted (for local dev only)
    pub fn new(
        smtp_host: &str,
        smtp_port: u16,
        credentials: Option<(&str, &str)>,
        encryption: &str,
        from_email: &str,
    ) -> Result<Self> {
        let mut builder = match encryption {
            "tls" => AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)
                .context("failed to create SMTP relay transport")?
                .port(smtp_port),
            "none" => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp_host).port(smtp_port)
            }
            _ => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)
                .context("failed to create SMTP STARTTLS transport")?
                .port(smtp_port),
        };

        if let Some((user, pass)) = credentials {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        Ok(Self {
            transport: builder.build(),
            from: from_email.parse().context("invalid from email address")?,
        })
    }

    fn message(&self, subject: &str, body: &str, recipients: &[String]) -> Result<Message> {
        anyhow::ensure!(!recipients.is_empty(), "no recipients");

        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);
        for to in recipients {
            let mailbox: Mailbox = to
                .parse()
                .with_context(|| format!("invalid recipient email address '{to}'"))?;
            builder = builder.to(mailbox);
        }

        builder
            .body(body.to_string())
            .context("failed to build email message")
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, subject: &str, body: &str, recipients: &[String]) -> Result<()> {
        let email = self.message(subject, body, recipients)?;
        self.transport
            .send(email)
            .await
            .context("failed to send email")?;
        Ok(())
    }
}

/// Build the configured notifier: SMTP when a host is set, otherwise disabled.
pub fn from_config(config: &Config) -> Result<Box<dyn Notifier>> {
    let Some(host) = config.smtp_host.as_deref() else {
        return Ok(Box::new(DisabledNotifier));
    };

    let credentials = config
        .smtp_username
        .as_deref()
        .zip(config.smtp_password.as_deref());

    let notifier = SmtpNotifier::new(
        host,
        config.smtp_port,
        credentials,
        &config.smtp_encryption,
        &config.smtp_from_email,
    )?;
    Ok(Box::new(notifier))
}
