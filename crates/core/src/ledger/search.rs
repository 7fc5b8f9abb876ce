//! Transaction search filters.
//!
//! Every field is optional. Set fields are ANDed together; unset fields
//! match every row, including rows where the column is null.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{GroupId, PaymentMethodId, UserId};

use super::transaction::TransactionStatus;
use crate::error::{LedgerError, LedgerResult};
use crate::validation::{non_negative_amount, positive_id};

/// Criteria for searching transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Lender to match.
    pub lender_id: Option<UserId>,
    /// Borrower to match.
    pub borrower_id: Option<UserId>,
    /// Group to match.
    pub group_id: Option<GroupId>,
    /// Status to match.
    pub status: Option<TransactionStatus>,
    /// Inclusive lower bound on amount.
    pub min_amount: Option<Decimal>,
    /// Inclusive upper bound on amount.
    pub max_amount: Option<Decimal>,
    /// Payment method to match.
    pub payment_method_id: Option<PaymentMethodId>,
}

impl TransactionFilter {
    /// Returns true if no criterion is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lender_id.is_none()
            && self.borrower_id.is_none()
            && self.group_id.is_none()
            && self.status.is_none()
            && self.min_amount.is_none()
            && self.max_amount.is_none()
            && self.payment_method_id.is_none()
    }

    /// Checks that the filter can be executed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if no criterion is set, an id is not
    /// positive, a bound is negative, or `min_amount > max_amount`.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.is_empty() {
            return Err(LedgerError::InvalidArgument(
                "at least one search filter must be set".to_string(),
            ));
        }
        if let Some(id) = self.lender_id {
            positive_id("lender_id", id.get())?;
        }
        if let Some(id) = self.borrower_id {
            positive_id("borrower_id", id.get())?;
        }
        if let Some(id) = self.group_id {
            positive_id("group_id", id.get())?;
        }
        if let Some(id) = self.payment_method_id {
            positive_id("payment_method_id", id.get())?;
        }
        if let Some(min) = self.min_amount {
            non_negative_amount("min_amount", min)?;
        }
        if let Some(max) = self.max_amount {
            non_negative_amount("max_amount", max)?;
        }
        if let (Some(min), Some(max)) = (self.min_amount, self.max_amount)
            && min > max
        {
            return Err(LedgerError::InvalidArgument(format!(
                "min_amount {min} is greater than max_amount {max}"
            )));
        }
        Ok(())
    }
}
