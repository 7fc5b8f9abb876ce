//! Notification collaborator interface.
//!
//! Ledger operations hand finished messages to a [`Notifier`]; delivery is
//! best-effort and never feeds back into the write that triggered it.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

/// Notification delivery errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Failed to build the message.
    #[error("Failed to build notification: {0}")]
    Build(String),
    /// The transport rejected or failed to deliver the message.
    #[error("Failed to deliver notification: {0}")]
    Delivery(String),
    /// The recipient address is malformed.
    #[error("Invalid recipient address: {0}")]
    InvalidAddress(String),
}

/// Sends a plain-text message to a single recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers `body` to `to` with the given subject.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Notifier that only records messages in the log.
///
/// Used when SMTP delivery is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!(recipient = %to, subject = %subject, body_len = body.len(), "Notification logged");
        Ok(())
    }
}
