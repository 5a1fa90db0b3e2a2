use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::EmailConfig;
use crate::error::MailError;

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

pub trait Mailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    config: EmailConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| MailError::Smtp(e.to_string()))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.sender.clone(),
                config.app_password.clone(),
            ))
            .build();
        Ok(Self { config, transport })
    }
}

impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let message = build_message(&self.config, email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Smtp(e.to_string()))?;
        info!(
            host = %self.config.smtp_host,
            recipients = self.config.recipients.len(),
            "Report email delivered"
        );
        Ok(())
    }
}

pub fn build_message(config: &EmailConfig, email: &OutgoingEmail) -> Result<Message, MailError> {
    if config.recipients.is_empty() {
        return Err(MailError::NoRecipients);
    }

    let mut builder = Message::builder()
        .from(parse_mailbox(&config.sender)?)
        .subject(email.subject.clone());
    for recipient in &config.recipients {
        builder = builder.to(parse_mailbox(recipient)?);
    }

    builder
        .multipart(MultiPart::alternative_plain_html(
            email.text.clone(),
            email.html.clone(),
        ))
        .map_err(|e| MailError::Build(e.to_string()))
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse::<Mailbox>().map_err(|e| MailError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(recipients: &[&str]) -> EmailConfig {
        EmailConfig {
            sender: "reports@example.com".to_string(),
            app_password: "app-pass".to_string(),
            recipients: recipients.iter().map(|r| r.to_string()).collect(),
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 465,
        }
    }

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            subject: "📊 Produtividade Team — 04/03/2026".to_string(),
            html: "<p>hello</p>".to_string(),
            text: "hello".to_string(),
        }
    }

    #[test]
    fn envelope_lists_every_recipient() {
        let message = build_message(&config(&["a@example.com", "b@example.com"]), &email()).unwrap();
        let envelope = message.envelope();
        let to: Vec<String> = envelope.to().iter().map(|a| a.to_string()).collect();
        assert_eq!(to, vec!["a@example.com", "b@example.com"]);
        assert_eq!(
            envelope.from().map(|a| a.to_string()),
            Some("reports@example.com".to_string())
        );
    }

    #[test]
    fn body_is_multipart_alternative_with_html() {
        let message = build_message(&config(&["a@example.com"]), &email()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/html"));
        assert!(raw.contains("text/plain"));
    }

    #[test]
    fn invalid_recipient_is_rejected() {
        let err = build_message(&config(&["not an address"]), &email()).unwrap_err();
        assert!(matches!(err, MailError::Address { address, .. } if address == "not an address"));
    }

    #[test]
    fn empty_recipient_list_is_rejected() {
        let err = build_message(&config(&[]), &email()).unwrap_err();
        assert!(matches!(err, MailError::NoRecipients));
    }
}
