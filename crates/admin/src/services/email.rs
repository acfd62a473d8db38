//! Welcome emails over SMTP.
//!
//! Sending is best effort: registration spawns [`EmailService::send_welcome_email`]
//! and only logs a failure.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

const WELCOME_SUBJECT: &str = "Welcome to Backoffice";

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeHtml<'a> {
    name: &'a str,
    login_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome.txt")]
struct WelcomeText<'a> {
    name: &'a str,
    login_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Both bodies of an outgoing message.
#[derive(Debug, PartialEq, Eq)]
struct Rendered {
    text: String,
    html: String,
}

/// Render the welcome message for `name`, linking to `login_url`.
fn render_welcome(name: &str, login_url: &str) -> Result<Rendered, EmailError> {
    Ok(Rendered {
        text: WelcomeText { name, login_url }.render()?,
        html: WelcomeHtml { name, login_url }.render()?,
    })
}

fn mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .parse()
        .map_err(|_| EmailError::InvalidAddress(address.to_string()))
}

/// SMTP sender for account emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    login_url: String,
}

impl EmailService {
    /// Build the STARTTLS transport and check the sender address.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::InvalidAddress` for a bad `SMTP_FROM` and
    /// `EmailError::Smtp` if the relay cannot be configured.
    pub fn new(config: &EmailConfig, base_url: &str) -> Result<Self, EmailError> {
        let from = mailbox(&config.from_address)?;
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
            from,
            login_url: format!("{}/login", base_url.trim_end_matches('/')),
        })
    }

    /// Greet a newly registered account.
    ///
    /// # Errors
    ///
    /// Returns an error if the recipient is malformed, rendering fails or the
    /// relay rejects the message.
    pub async fn send_welcome_email(&self, to: &str, name: &str) -> Result<(), EmailError> {
        let recipient = mailbox(to)?;
        let body = render_welcome(name, &self.login_url)?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(WELCOME_SUBJECT)
            .multipart(MultiPart::alternative_plain_html(body.text, body.html))?;

        self.mailer.send(message).await?;
        tracing::info!(to = %to, "Welcome email sent");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_email_mentions_name_and_login_link() {
        let body = render_welcome("Jane <Doe>", "https://admin.backoffice.dev/login").unwrap();
        assert!(body.text.contains("Jane <Doe>"));
        assert!(body.text.contains("https://admin.backoffice.dev/login"));
        // HTML body escapes user input
        assert!(body.html.contains("Jane &#60;Doe&#62;") || body.html.contains("Jane &lt;Doe&gt;"));
        assert!(body.html.contains("https://admin.backoffice.dev/login"));
    }

    #[test]
    fn test_mailbox_rejects_garbage() {
        assert!(mailbox("noreply@backoffice.dev").is_ok());
        assert!(matches!(
            mailbox("not an address"),
            Err(EmailError::InvalidAddress(a)) if a == "not an address"
        ));
    }
}
