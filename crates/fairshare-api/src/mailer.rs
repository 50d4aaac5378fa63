//! Outbound email: contact confirmations, admin notifications and replies.

use std::sync::Arc;

use async_trait::async_trait;
use fairshare_persist::Contact;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address {0}")]
    Address(String),

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// SMTP over implicit TLS
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        username: String,
        password: String,
        from: Mailbox,
    ) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(port)
            .credentials(Credentials::new(username, password))
            .build();
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|_| MailError::Address(email.to.clone()))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// Used when email is disabled or unconfigured; records what would be sent
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(to = %email.to, subject = %email.subject, "Email delivery disabled, not sent");
        Ok(())
    }
}

/// Pick the SMTP mailer when it is enabled and credentials are present
pub fn from_config(config: &Config) -> anyhow::Result<Arc<dyn Mailer>> {
    let credentials = config.email_user.clone().zip(config.email_pass.clone());
    let (Some((user, pass)), Some(from_address), true) =
        (credentials, config.mail_from(), config.email.enabled)
    else {
        tracing::warn!("Email disabled or EMAIL_USER/EMAIL_PASS missing, emails will only be logged");
        return Ok(Arc::new(LogMailer));
    };

    let from = format!("{} <{}>", config.email.from_name, from_address)
        .parse::<Mailbox>()
        .map_err(|e| anyhow::anyhow!("Invalid sender address: {}", e))?;
    let mailer = SmtpMailer::new(&config.email.smtp_host, config.email.smtp_port, user, pass, from)?;
    Ok(Arc::new(mailer))
}

/// Send without making the caller wait; failures are logged
pub fn send_in_background(mailer: Arc<dyn Mailer>, email: OutgoingEmail) {
    tokio::spawn(async move {
        let to = email.to.clone();
        if let Err(e) = mailer.send(email).await {
            tracing::error!(to = %to, error = %e, "Background email failed");
        }
    });
}

pub fn contact_confirmation(contact: &Contact, company: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: contact.email.clone(),
        subject: format!("Thank you for contacting {}", company),
        body: format!(
            "Thank you for reaching out, {}!\n\n\
             We have received your message and will get back to you as soon as possible.\n\n\
             For your reference, here's a copy of your message:\n\n{}\n\n\
             Best regards,\n{} Team",
            contact.name, contact.message, company
        ),
    }
}

pub fn admin_notification(contact: &Contact, admin: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: admin.to_string(),
        subject: "New Contact Form Submission".to_string(),
        body: format!(
            "New contact form submission\n\n\
             Time: {}\nName: {}\nEmail: {}\n\nMessage:\n{}",
            contact.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            contact.name,
            contact.email,
            contact.message
        ),
    }
}

pub fn contact_reply(contact: &Contact, subject: &str, message: &str, company: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: contact.email.clone(),
        subject: subject.to_string(),
        body: format!(
            "Dear {},\n\n{}\n\nBest regards,\n{} Team",
            contact.name, message, company
        ),
    }
}
