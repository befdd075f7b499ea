//! Email delivery of a rendered brief.

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::error::MailError;

/// Fixed SMTP provider, reached over implicit TLS (port 465).
pub const SMTP_HOST: &str = "smtp.gmail.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Login for the SMTP provider. The password only ever comes from the environment.
#[derive(Clone)]
pub struct SmtpCredentials {
    pub username: String,
    password: String,
}

impl SmtpCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_env(username: impl Into<String>, password_env: &str) -> Result<Self, MailError> {
        let password = std::env::var(password_env)
            .map_err(|_| MailError::MissingCredential(password_env.to_string()))?;
        Ok(Self::new(username, password))
    }
}

impl std::fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    /// One delivery attempt; no retry.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Sends through [`SMTP_HOST`]. The password is read from `password_env` on
/// every send, so a missing secret only costs the email.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    host: String,
    username: String,
    password_env: String,
}

impl SmtpMailer {
    pub fn from_env(username: impl Into<String>, password_env: impl Into<String>) -> Self {
        Self {
            host: SMTP_HOST.to_string(),
            username: username.into(),
            password_env: password_env.into(),
        }
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let credentials = SmtpCredentials::from_env(self.username.clone(), &self.password_env)?;
        let message = build_message(email)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .credentials(Credentials::new(credentials.username, credentials.password))
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        info!(to = %email.to, host = %self.host, "brief emailed");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse::<Mailbox>().map_err(|e| MailError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Multipart/alternative message: plain text first, HTML preferred.
pub fn build_message(email: &OutgoingEmail) -> Result<Message, MailError> {
    Message::builder()
        .from(parse_mailbox(&email.from)?)
        .to(parse_mailbox(&email.to)?)
        .subject(email.subject.clone())
        .multipart(MultiPart::alternative_plain_html(
            email.text_body.clone(),
            email.html_body.clone(),
        ))
        .map_err(|e| MailError::Build(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(to: &str) -> OutgoingEmail {
        OutgoingEmail {
            from: "brief@example.com".into(),
            to: to.into(),
            subject: "News Brief \u{2013} October 19, 2026".into(),
            html_body: "<h1>Daily News Brief</h1>".into(),
            text_body: "Daily News Brief".into(),
        }
    }

    #[test]
    fn builds_multipart_message() {
        let message = build_message(&email("reader@example.com")).expect("build message");
        let raw = String::from_utf8(message.formatted()).expect("utf8");
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/html"));
        assert!(raw.contains("text/plain"));
    }

    #[test]
    fn rejects_bad_recipient() {
        let err = build_message(&email("not an address")).unwrap_err();
        assert!(matches!(err, MailError::Address { .. }));
    }

    #[tokio::test]
    async fn send_without_password_fails_before_connecting() {
        let mailer = SmtpMailer::from_env("me@example.com", "NEWSBRIEF_TEST_UNSET_SEND_PASSWORD");
        let err = mailer.send(&email("reader@example.com")).await.unwrap_err();
        assert!(matches!(err, MailError::MissingCredential(ref var) if var == "NEWSBRIEF_TEST_UNSET_SEND_PASSWORD"));
    }

    #[test]
    fn missing_password_env_is_reported() {
        let err = SmtpCredentials::from_env("me@example.com", "NEWSBRIEF_TEST_UNSET_PASSWORD")
            .unwrap_err();
        assert!(matches!(err, MailError::MissingCredential(_)));
    }
}
