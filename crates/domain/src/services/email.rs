//! Email sending abstraction.
//!
//! The dispatcher composes messages; an `EmailSender` implementation
//! carries them. Real providers live in the api crate, the mock here
//! records what would have gone out.

use std::sync::{Arc, Mutex};

use thiserror::Error;

/// One outbound email, provider-agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
}

/// Errors a sender can report.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email transport failed: {0}")]
    Transport(String),

    #[error("email rejected by provider: {0}")]
    Rejected(String),

    #[error("email provider misconfigured: {0}")]
    Configuration(String),
}

/// Email sender trait implemented by each provider.
#[async_trait::async_trait]
pub trait EmailSender: Send + Sync {
    /// Hand one message to the provider.
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

/// Mock email sender for development and testing.
///
/// Records every accepted message instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct MockEmailSender {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl MockEmailSender {
    /// Create a new mock email sender.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock sender that simulates failures.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Messages accepted so far, in send order.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of messages accepted so far.
    pub fn sent_count(&self) -> usize {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait::async_trait]
impl EmailSender for MockEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        if self.simulate_failure {
            tracing::warn!(
                to = %message.to,
                subject = %message.subject,
                "Mock email sender simulating failure"
            );
            return Err(EmailError::Transport("Simulated failure".to_string()));
        }

        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "Mock: Would send email"
        );

        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.clone());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(subject: &str) -> EmailMessage {
        EmailMessage {
            to: "owner@example.com".to_string(),
            to_name: Some("Owner".to_string()),
            subject: subject.to_string(),
            body_text: "Body".to_string(),
            body_html: None,
        }
    }

    #[tokio::test]
    async fn test_mock_sender_records_messages() {
        let sender = MockEmailSender::new();
        sender.send(&message("First")).await.unwrap();
        sender.send(&message("Second")).await.unwrap();

        assert_eq!(sender.sent_count(), 2);
        assert_eq!(sender.sent()[0].subject, "First");
        assert_eq!(sender.sent()[1].subject, "Second");
    }

    #[tokio::test]
    async fn test_failing_sender_records_nothing() {
        let sender = MockEmailSender::failing();
        let result = sender.send(&message("First")).await;

        assert!(matches!(result, Err(EmailError::Transport(_))));
        assert_eq!(sender.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_clones_share_the_sent_log() {
        let sender = MockEmailSender::new();
        let clone = sender.clone();
        clone.send(&message("Shared")).await.unwrap();

        assert_eq!(sender.sent_count(), 1);
    }
}
