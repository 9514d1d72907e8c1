//! SMTP delivery for digest emails.
//!
//! One STARTTLS session per message, authenticated with the configured
//! credentials. [`MailSender::send_html`] reports failure as `false` and
//! never lets a transport error escape, so one bad recipient cannot take
//! down a batch.

use crate::config::SmtpConfig;
use lettre::{
    message::MultiPart,
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};

const PLAIN_FALLBACK: &str = "This digest is best viewed in an HTML-capable mail client.";

pub trait MailSender: Send + Sync {
    fn send_html(&self, recipient: &str, subject: &str, html_body: &str) -> bool;
}

pub struct Mailer {
    host: String,
    port: u16,
    username: String,
    password: String,
}

impl Mailer {
    /// Build a sender from config plus `SMTP_USERNAME`/`SMTP_PASSWORD`.
    /// Fails fast when either credential is absent.
    pub fn from_env(smtp: &SmtpConfig) -> anyhow::Result<Self> {
        let username = std::env::var("SMTP_USERNAME").ok().filter(|v| !v.is_empty());
        let password = std::env::var("SMTP_PASSWORD").ok().filter(|v| !v.is_empty());

        let (Some(username), Some(password)) = (username, password) else {
            anyhow::bail!("SMTP_USERNAME and SMTP_PASSWORD must be set in the environment");
        };

        Ok(Mailer {
            host: smtp.host.clone(),
            port: smtp.port,
            username,
            password,
        })
    }

    fn build_message(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
    ) -> anyhow::Result<Message> {
        let message = Message::builder()
            .from(self.username.parse()?)
            .to(recipient.parse()?)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                PLAIN_FALLBACK.to_string(),
                html_body.to_string(),
            ))?;

        Ok(message)
    }
}

impl MailSender for Mailer {
    fn send_html(&self, recipient: &str, subject: &str, html_body: &str) -> bool {
        let message = match self.build_message(recipient, subject, html_body) {
            Ok(message) => message,
            Err(err) => {
                log::error!("failed to build message for {recipient}: {err:?}");
                return false;
            }
        };

        let transport = match SmtpTransport::starttls_relay(&self.host) {
            Ok(builder) => builder
                .port(self.port)
                .credentials(Credentials::new(
                    self.username.clone(),
                    self.password.clone(),
                ))
                .build(),
            Err(err) => {
                log::error!("failed to open smtp session to {}: {err:?}", self.host);
                return false;
            }
        };

        match transport.send(&message) {
            Ok(_) => true,
            Err(err) => {
                log::error!("send email failed for {recipient}: {err:?}");
                false
            }
        }
    }
}
