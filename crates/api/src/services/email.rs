//! Email delivery behind the `EmailSender` trait.
//!
//! Supported providers:
//! - `console`: logs emails (development)
//! - `smtp`: logs a structured record of what would go out
//! - `sendgrid`: SendGrid v3 mail send API
//!
//! Message composition lives in the notification dispatcher; this
//! service only moves a finished `EmailMessage`.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use domain::services::email::{EmailError, EmailMessage, EmailSender};

use crate::config::EmailConfig;

/// Transactional email delivery with a provider switch from config.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
}

impl EmailService {
    /// Creates a new EmailService with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Check if email delivery is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Console provider - logs email to console (for development).
    async fn send_console(&self, message: &EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            to_name = ?message.to_name,
            subject = %message.subject,
            from = %self.config.sender_email,
            from_name = %self.config.sender_name,
            "Email (console provider)"
        );

        info!(
            body_text = %message.body_text,
            "Email body (plain text)"
        );

        if let Some(html) = &message.body_html {
            debug!(
                body_html_length = %html.len(),
                "Email body (HTML)"
            );
        }

        Ok(())
    }

    /// SMTP provider - records what would be sent.
    ///
    /// Full SMTP needs the lettre crate; until then the record is logged
    /// and the send reported as successful.
    async fn send_smtp(&self, message: &EmailMessage) -> Result<(), EmailError> {
        if self.config.smtp_host.is_empty() {
            return Err(EmailError::Configuration(
                "smtp_host is not configured".to_string(),
            ));
        }

        warn!(
            provider = "smtp",
            host = %self.config.smtp_host,
            port = %self.config.smtp_port,
            "SMTP provider configured but full implementation requires lettre crate"
        );

        info!(
            to = %message.to,
            subject = %message.subject,
            smtp_host = %self.config.smtp_host,
            "Email would be sent via SMTP"
        );

        Ok(())
    }

    /// SendGrid provider - sends via SendGrid API.
    async fn send_sendgrid(&self, message: &EmailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::Configuration(
                "sendgrid_api_key is not configured".to_string(),
            ));
        }

        let client = reqwest::Client::new();

        let mut personalizations = serde_json::json!({
            "to": [{
                "email": message.to
            }]
        });

        if let Some(name) = &message.to_name {
            personalizations["to"][0]["name"] = serde_json::json!(name);
        }

        let mut body = serde_json::json!({
            "personalizations": [personalizations],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": message.subject,
            "content": [{
                "type": "text/plain",
                "value": message.body_text
            }]
        });

        if let Some(html) = &message.body_html {
            body["content"]
                .as_array_mut()
                .unwrap()
                .push(serde_json::json!({
                    "type": "text/html",
                    "value": html
                }));
        }

        let response = client
            .post("https://api.sendgrid.com/v3/mail/send")
            .header(
                "Authorization",
                format!("Bearer {}", self.config.sendgrid_api_key),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::Transport(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(
                to = %message.to,
                subject = %message.subject,
                "Email sent via SendGrid"
            );
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(
                status = %status,
                error = %error_body,
                "SendGrid API error"
            );
            Err(EmailError::Rejected(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }
}

#[async_trait]
impl EmailSender for EmailService {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email delivery disabled, skipping send"
            );
            return Ok(());
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message).await,
            "smtp" => self.send_smtp(message).await,
            "sendgrid" => self.send_sendgrid(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::Configuration(format!(
                    "Unknown email provider: {}",
                    provider
                )))
            }
        }
    }
}
