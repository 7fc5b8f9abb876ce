//! Payment request lifecycle.
//!
//! Valid transitions:
//! - Pending → Accepted
//! - Pending → Declined
//!
//! Accepted and Declined are terminal.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{GroupId, UserId};

use crate::error::{LedgerError, LedgerResult};
use crate::validation::{positive_amount, positive_id};

/// Status of a payment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Awaiting the receiver's answer.
    Pending,
    /// Receiver agreed to pay.
    Accepted,
    /// Receiver refused.
    Declined,
}

impl RequestStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Declined)
    }

    /// Validates a move to `next`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless moving from pending to a terminal status.
    pub fn transition(self, next: Self) -> LedgerResult<Self> {
        match (self, next) {
            (Self::Pending, Self::Accepted | Self::Declined) => Ok(next),
            _ => Err(LedgerError::InvalidTransition {
                entity: "request",
                from: self.to_string(),
                to: next.to_string(),
            }),
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
            .ok_or_else(|| LedgerError::InvalidArgument(format!("unknown request status {s:?}")))
    }
}

/// Input for creating a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewRequest {
    /// User asking for money.
    pub sender_id: UserId,
    /// User being asked.
    pub receiver_id: UserId,
    /// Optional group context.
    pub group_id: Option<GroupId>,
    /// Requested amount.
    pub amount: Decimal,
}

impl NewRequest {
    /// Creates a request input outside any group.
    #[must_use]
    pub const fn new(sender_id: UserId, receiver_id: UserId, amount: Decimal) -> Self {
        Self {
            sender_id,
            receiver_id,
            group_id: None,
            amount,
        }
    }

    /// Sets the group.
    #[must_use]
    pub const fn in_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// Checks the input shape.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-positive amount or id.
    pub fn validate(&self) -> LedgerResult<()> {
        positive_amount("amount", self.amount)?;
        positive_id("sender_id", self.sender_id.get())?;
        positive_id("receiver_id", self.receiver_id.get())?;
        if let Some(group_id) = self.group_id {
            positive_id("group_id", group_id.get())?;
        }
        Ok(())
    }
}
