//! Outbound email delivery.
//!
//! Handlers send through the [`EmailSender`] trait. Production uses
//! [`BrevoEmailSender`] against the Brevo transactional API; local development
//! falls back to [`LogEmailSender`], which logs the payload and succeeds.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::info;

const BREVO_ENDPOINT: &str = "https://api.brevo.com/v3/smtp/email";

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub html_body: String,
}

/// Email delivery abstraction.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error.
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs instead of delivering.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            "email send stub"
        );
        Ok(())
    }
}

/// Sender backed by the Brevo transactional email API.
pub struct BrevoEmailSender {
    http: reqwest::Client,
    api_key: SecretString,
    sender_email: String,
    sender_name: String,
}

impl BrevoEmailSender {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        api_key: SecretString,
        sender_email: String,
        sender_name: String,
    ) -> Self {
        Self {
            http,
            api_key,
            sender_email,
            sender_name,
        }
    }
}

#[async_trait]
impl EmailSender for BrevoEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let payload = json!({
            "sender": {
                "name": self.sender_name,
                "email": self.sender_email,
            },
            "to": [{ "email": message.to_email }],
            "subject": message.subject,
            "htmlContent": message.html_body,
        });

        let response = self
            .http
            .post(BREVO_ENDPOINT)
            .header("api-key", self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .context("failed to reach email provider")?;

        let status = response.status();
        if !status.is_success() {
            bail!("email provider returned {status}");
        }
        Ok(())
    }
}

/// Build the frontend verification link included in outbound emails.
pub(crate) fn build_verify_url(frontend_base_url: &str, token: &str) -> String {
    let base = frontend_base_url.trim_end_matches('/');
    format!("{base}/verify-email?token={token}")
}

/// The verification email sent at registration and on resend.
pub(crate) fn verification_email(
    frontend_base_url: &str,
    to_email: &str,
    token: &str,
) -> EmailMessage {
    let verify_url = build_verify_url(frontend_base_url, token);
    EmailMessage {
        to_email: to_email.to_string(),
        subject: "Verify your Deep Work Timer account".to_string(),
        html_body: format!(
            "<p>Welcome to Deep Work Timer!</p>\
             <p>Please <a href=\"{verify_url}\">verify your email address</a> to activate your account.</p>"
        ),
    }
}
