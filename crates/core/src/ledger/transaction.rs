//! Transaction lifecycle.
//!
//! Valid transitions:
//! - Pending → Completed
//! - Pending → Failed
//! - Failed → Pending (retry)
//!
//! Completed is terminal.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{GroupId, PaymentMethodId, UserId};

use crate::error::{LedgerError, LedgerResult};
use crate::validation::{optional_text, positive_amount, positive_id};

/// Status of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Recorded, not yet settled. Splits may still change.
    Pending,
    /// Settled. Counts toward balances.
    Completed,
    /// Settlement failed; may be retried.
    Failed,
}

impl TransactionStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns true if moving to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Completed | Self::Failed) | (Self::Failed, Self::Pending)
        )
    }

    /// Returns true if splits can be added in this status.
    #[must_use]
    pub const fn accepts_splits(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns true if transactions in this status count toward balances.
    #[must_use]
    pub const fn counts_toward_balance(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Validates a move to `next`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the state machine forbids the move.
    pub fn transition(self, next: Self) -> LedgerResult<StatusChange> {
        if !self.can_transition_to(next) {
            return Err(LedgerError::InvalidTransition {
                entity: "transaction",
                from: self.to_string(),
                to: next.to_string(),
            });
        }
        Ok(StatusChange {
            from: self,
            to: next,
        })
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            LedgerError::InvalidArgument(format!("unknown transaction status {s:?}"))
        })
    }
}

/// An allowed status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    /// Status before the change.
    pub from: TransactionStatus,
    /// Status after the change.
    pub to: TransactionStatus,
}

impl StatusChange {
    /// Returns true if this change re-opens a failed transaction.
    #[must_use]
    pub const fn is_retry(&self) -> bool {
        matches!(
            (self.from, self.to),
            (TransactionStatus::Failed, TransactionStatus::Pending)
        )
    }

    /// Returns true if balances must be recomputed after this change.
    #[must_use]
    pub const fn affects_balances(&self) -> bool {
        self.from.counts_toward_balance() || self.to.counts_toward_balance()
    }
}

/// Input for creating a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// User who paid.
    pub lender_id: UserId,
    /// User who owes.
    pub borrower_id: UserId,
    /// Optional group the expense belongs to.
    pub group_id: Option<GroupId>,
    /// Positive amount.
    pub amount: Decimal,
    /// Free-text description.
    pub purpose: Option<String>,
    /// Instrument used to settle.
    pub payment_method_id: Option<PaymentMethodId>,
}

impl NewTransaction {
    /// Creates an input with no group, purpose or payment method.
    #[must_use]
    pub const fn new(lender_id: UserId, borrower_id: UserId, amount: Decimal) -> Self {
        Self {
            lender_id,
            borrower_id,
            group_id: None,
            amount,
            purpose: None,
            payment_method_id: None,
        }
    }

    /// Sets the group.
    #[must_use]
    pub const fn in_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// Sets the purpose.
    #[must_use]
    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    /// Sets the payment method.
    #[must_use]
    pub const fn paid_with(mut self, payment_method_id: PaymentMethodId) -> Self {
        self.payment_method_id = Some(payment_method_id);
        self
    }

    /// Checks the input shape and returns it with the purpose trimmed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-positive amount or id.
    pub fn validated(self) -> LedgerResult<Self> {
        positive_amount("amount", self.amount)?;
        positive_id("lender_id", self.lender_id.get())?;
        positive_id("borrower_id", self.borrower_id.get())?;
        if let Some(group_id) = self.group_id {
            positive_id("group_id", group_id.get())?;
        }
        if let Some(payment_method_id) = self.payment_method_id {
            positive_id("payment_method_id", payment_method_id.get())?;
        }
        Ok(Self {
            purpose: optional_text(self.purpose.as_deref()),
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(TransactionStatus::Pending, TransactionStatus::Completed, true)]
    #[case(TransactionStatus::Pending, TransactionStatus::Failed, true)]
    #[case(TransactionStatus::Failed, TransactionStatus::Pending, true)]
    #[case(TransactionStatus::Pending, TransactionStatus::Pending, false)]
    #[case(TransactionStatus::Failed, TransactionStatus::Completed, false)]
    #[case(TransactionStatus::Completed, TransactionStatus::Pending, false)]
    #[case(TransactionStatus::Completed, TransactionStatus::Failed, false)]
    fn test_transitions(
        #[case] from: TransactionStatus,
        #[case] to: TransactionStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
        assert_eq!(from.transition(to).is_ok(), allowed);
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = TransactionStatus::Completed
            .transition(TransactionStatus::Failed)
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert!(err.to_string().contains("completed"));
        assert!(err.to_string().contains("failed"));
    }

    #[test]
    fn test_status_change_flags() {
        let retry = TransactionStatus::Failed
            .transition(TransactionStatus::Pending)
            .unwrap();
        assert!(retry.is_retry());
        assert!(!retry.affects_balances());

        let settle = TransactionStatus::Pending
            .transition(TransactionStatus::Completed)
            .unwrap();
        assert!(!settle.is_retry());
        assert!(settle.affects_balances());
    }

    #[test]
    fn test_only_pending_accepts_splits() {
        assert!(TransactionStatus::Pending.accepts_splits());
        assert!(!TransactionStatus::Completed.accepts_splits());
        assert!(!TransactionStatus::Failed.accepts_splits());
        assert!(TransactionStatus::Completed.is_terminal());
    }

    #[test]
    fn test_parse_roundtrip() {
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Completed,
            TransactionStatus::Failed,
        ] {
            assert_eq!(TransactionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(
            "COMPLETED".parse::<TransactionStatus>().unwrap(),
            TransactionStatus::Completed
        );
        assert!("settled".parse::<TransactionStatus>().is_err());
    }

    #[test]
    fn test_new_transaction_validation() {
        let input = NewTransaction::new(UserId::new(1), UserId::new(2), dec!(100))
            .in_group(GroupId::new(3))
            .with_purpose("  dinner ");
        let validated = input.validated().unwrap();
        assert_eq!(validated.purpose.as_deref(), Some("dinner"));
    }

    #[rstest]
    #[case(NewTransaction::new(UserId::new(1), UserId::new(2), dec!(0)))]
    #[case(NewTransaction::new(UserId::new(1), UserId::new(2), dec!(-10)))]
    #[case(NewTransaction::new(UserId::new(0), UserId::new(2), dec!(10)))]
    #[case(NewTransaction::new(UserId::new(1), UserId::new(0), dec!(10)))]
    #[case(NewTransaction::new(UserId::new(1), UserId::new(2), dec!(10)).in_group(GroupId::new(-1)))]
    fn test_new_transaction_rejects(#[case] input: NewTransaction) {
        assert!(matches!(
            input.validated(),
            Err(LedgerError::InvalidArgument(_))
        ));
    }
}
