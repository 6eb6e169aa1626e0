use anyhow::Context;
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use uuid::Uuid;

use crate::config::Config;

/// One outbound email, constructed per request and discarded after dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl OutboundEmail {
    /// The HTML body is the plain-text body with newlines turned into
    /// line-break markup, matching what mail clients expect from the
    /// callers of this API.
    pub fn new(to: &str, subject: &str, body: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: subject.to_string(),
            text_body: body.to_string(),
            html_body: body.replace('\n', "<br>"),
        }
    }
}

/// Seam over the SMTP collaborator so handlers can be exercised against a
/// recording stub.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Delivers the email exactly once and returns the message id.
    async fn send(&self, mail: &OutboundEmail) -> anyhow::Result<String>;
}

/// lettre-backed STARTTLS submission client.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let tls = TlsParameters::builder(config.smtp_host.clone())
            .dangerous_accept_invalid_certs(config.smtp_accept_invalid_certs)
            .build()
            .context("invalid TLS parameters")?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .with_context(|| format!("invalid SMTP host {}", config.smtp_host))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.sender.clone(),
                config.sender_password.clone(),
            ))
            .tls(Tls::Required(tls))
            .timeout(Some(config.smtp_timeout))
            .build();

        let from = config
            .sender
            .parse()
            .with_context(|| format!("invalid sender address {}", config.sender))?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: &OutboundEmail) -> anyhow::Result<String> {
        let message_id = format!("<{}@mail-relay>", Uuid::new_v4());

        let message = Message::builder()
            .from(self.from.clone())
            .to(mail
                .to
                .parse()
                .with_context(|| format!("invalid recipient address {}", mail.to))?)
            .subject(mail.subject.as_str())
            .message_id(Some(message_id.clone()))
            .multipart(MultiPart::alternative_plain_html(
                mail.text_body.clone(),
                mail.html_body.clone(),
            ))
            .context("failed to build email")?;

        self.transport
            .send(message)
            .await
            .context("smtp send failed")?;

        Ok(message_id)
    }
}
