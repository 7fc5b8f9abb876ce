//! Notification messages for request events.

use rust_decimal::Decimal;

use crate::request::RequestStatus;

/// A composed message ready for a `Notifier`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

impl Notification {
    /// Tells the receiver that a request arrived.
    #[must_use]
    pub fn request_received(receiver_email: &str, sender_name: &str, amount: Decimal) -> Self {
        Self {
            to: receiver_email.to_string(),
            subject: "Request Received".to_string(),
            body: format!(
                "You have received a request from {sender_name} for an amount of {amount:.2}"
            ),
        }
    }

    /// Tells the sender that the receiver answered their request.
    #[must_use]
    pub fn request_updated(
        sender_email: &str,
        receiver_name: &str,
        amount: Decimal,
        status: RequestStatus,
    ) -> Self {
        Self {
            to: sender_email.to_string(),
            subject: "Request Updated".to_string(),
            body: format!(
                "Your request to {receiver_name} for an amount of {amount:.2} has been {status}"
            ),
        }
    }
}
