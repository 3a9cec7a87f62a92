//! Email delivery collaborator used by the OTP verifier.

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("failed to send email: {0}")]
    SendFailed(String),

    #[error("provider rejected email with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Subject and plain-text body of a verification email.
pub fn verification_email(code: &str, valid_minutes: i64) -> (String, String) {
    (
        "Your Campus Cupid verification code".to_string(),
        format!("Your verification code is {code}. It is valid for {valid_minutes} minutes."),
    )
}

/// SendGrid v3 HTTP API.
pub struct SendGridMailer {
    client: reqwest::Client,
    api_key: String,
    from_address: String,
    from_name: String,
}

impl SendGridMailer {
    pub fn new(api_key: String, from_address: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from_address,
            from_name: "Campus Cupid".to_string(),
        }
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let payload = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.from_address, "name": self.from_name },
            "subject": subject,
            "content": [{ "type": "text/plain", "value": body }],
        });

        let response = self
            .client
            .post(SENDGRID_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailError::SendFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!("Email accepted by SendGrid for {}", to);
        Ok(())
    }
}

/// Development mailer: writes the message to the log instead of sending it.
/// Codes end up in plain text in the log, so never use it in production.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        warn!("[dev mailer] to={} subject={:?} body={:?}", to, subject, body);
        Ok(())
    }
}
