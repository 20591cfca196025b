//! Outbound account notifications.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates. Every send
//! is bounded by the configured timeout: a stuck relay fails the dispatch
//! instead of pinning the request, and the identity state already written
//! stays as committed.

use std::time::Duration;

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use oakwood_core::Email;

use crate::config::MailConfig;

/// HTML template for the email-confirmation message.
#[derive(Template)]
#[template(path = "email/confirm_email.html")]
struct ConfirmEmailHtml<'a> {
    url: &'a str,
}

/// Plain text template for the email-confirmation message.
#[derive(Template)]
#[template(path = "email/confirm_email.txt")]
struct ConfirmEmailText<'a> {
    url: &'a str,
}

/// HTML template for the temporary-password message.
#[derive(Template)]
#[template(path = "email/temporary_password.html")]
struct TemporaryPasswordHtml<'a> {
    password: &'a str,
}

/// Plain text template for the temporary-password message.
#[derive(Template)]
#[template(path = "email/temporary_password.txt")]
struct TemporaryPasswordText<'a> {
    password: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum MailerError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// The send did not complete within the configured bound.
    #[error("Send timed out after {0:?}")]
    Timeout(Duration),
}

/// Dispatcher for account lifecycle notifications.
///
/// The production implementation is [`SmtpMailer`]; tests swap in a
/// recording double.
#[async_trait]
pub trait AccountMailer: Send + Sync {
    /// Send the email-confirmation link to a freshly registered address.
    async fn send_confirmation_link(&self, to: &Email, url: &str) -> Result<(), MailerError>;

    /// Send a newly issued temporary password.
    async fn send_temporary_password(&self, to: &Email, password: &str)
    -> Result<(), MailerError>;
}

/// SMTP-backed mailer.
#[derive(Clone)]
pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    send_timeout: Duration,
}

impl SmtpMailer {
    /// Create a new mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay cannot be configured.
    pub fn new(config: &MailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            send_timeout: config.send_timeout,
        })
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), MailerError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| MailerError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| MailerError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        match tokio::time::timeout(self.send_timeout, self.mailer.send(email)).await {
            Ok(result) => {
                result?;
            }
            Err(_) => return Err(MailerError::Timeout(self.send_timeout)),
        }

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[async_trait]
impl AccountMailer for SmtpMailer {
    async fn send_confirmation_link(&self, to: &Email, url: &str) -> Result<(), MailerError> {
        let html = ConfirmEmailHtml { url }.render()?;
        let text = ConfirmEmailText { url }.render()?;

        self.send_multipart_email(to.as_str(), "Confirm your email address", &text, &html)
            .await
    }

    async fn send_temporary_password(
        &self,
        to: &Email,
        password: &str,
    ) -> Result<(), MailerError> {
        let html = TemporaryPasswordHtml { password }.render()?;
        let text = TemporaryPasswordText { password }.render()?;

        self.send_multipart_email(to.as_str(), "Your new password", &text, &html)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_templates_embed_url() {
        let url = "https://shop.example.com/users/email-confirm/abc123";
        let html = ConfirmEmailHtml { url }.render().unwrap();
        let text = ConfirmEmailText { url }.render().unwrap();
        assert!(html.contains(url));
        assert!(text.contains(url));
    }

    #[test]
    fn test_temporary_password_templates_embed_password() {
        let password = "s3cr3t!pw?";
        let html = TemporaryPasswordHtml { password }.render().unwrap();
        let text = TemporaryPasswordText { password }.render().unwrap();
        assert!(html.contains("s3cr3t!pw?"));
        assert!(text.contains("s3cr3t!pw?"));
    }
}
