//! Split rules.
//!
//! The splits of a transaction never add up to more than its amount, and a
//! transaction with splits can only complete once they cover it exactly.
//! Even allocation uses cent precision; leftover cents go to the first
//! participants so the shares always sum to the total exactly.

use std::collections::HashSet;

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use tally_shared::types::{TransactionId, UserId};

use crate::error::{LedgerError, LedgerResult};
use crate::validation::{MONEY_SCALE, positive_amount, positive_id};

/// One participant's share of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitAllocation {
    /// Participant.
    pub user_id: UserId,
    /// Amount owed by the participant.
    pub amount: Decimal,
}

/// Checks that a new split of `requested` fits in the transaction.
///
/// # Errors
///
/// Returns `InvalidArgument` if `requested` is not a positive money amount,
/// or `SplitExceedsAmount` if `allocated + requested > amount`.
pub fn check_split_fits(
    transaction: TransactionId,
    amount: Decimal,
    allocated: Decimal,
    requested: Decimal,
) -> LedgerResult<()> {
    positive_amount("split amount", requested)?;
    if allocated + requested > amount {
        return Err(LedgerError::SplitExceedsAmount {
            transaction,
            amount,
            allocated,
            requested,
        });
    }
    Ok(())
}

/// Checks that a transaction's splits allow it to complete.
///
/// A transaction without splits is owed in full by its borrower. Once any
/// split exists, the splits alone decide who owes what, so they must add up
/// to the whole amount.
///
/// # Errors
///
/// Returns `SplitsIncomplete` if `allocated` is neither zero nor `amount`.
pub fn check_splits_complete(
    transaction: TransactionId,
    amount: Decimal,
    allocated: Decimal,
) -> LedgerResult<()> {
    if allocated.is_zero() || allocated == amount {
        return Ok(());
    }
    Err(LedgerError::SplitsIncomplete {
        transaction,
        amount,
        allocated,
    })
}

/// Checks that `total` gives every participant at least one cent.
///
/// # Errors
///
/// Returns `InvalidArgument` if `total` is below one cent per participant.
pub fn check_even_share(total: Decimal, participants: usize) -> LedgerResult<()> {
    let minimum = Decimal::new(1, MONEY_SCALE) * Decimal::from(participants);
    if total < minimum {
        return Err(LedgerError::InvalidArgument(format!(
            "{total} cannot be split among {participants} participants"
        )));
    }
    Ok(())
}

/// Checks a participant list for an even split.
///
/// # Errors
///
/// Returns `InvalidArgument` if the list is empty, holds a non-positive id,
/// or names the same user twice.
pub fn validate_participants(user_ids: &[UserId]) -> LedgerResult<()> {
    if user_ids.is_empty() {
        return Err(LedgerError::InvalidArgument(
            "at least one participant is required".to_string(),
        ));
    }
    let mut seen = HashSet::with_capacity(user_ids.len());
    for user_id in user_ids {
        positive_id("user_id", user_id.get())?;
        if !seen.insert(*user_id) {
            return Err(LedgerError::InvalidArgument(format!(
                "user {user_id} appears more than once"
            )));
        }
    }
    Ok(())
}

/// Divides `total` evenly among `participants`.
///
/// The result is in participant order and sums to `total` rounded to cents.
/// Returns an empty vector for no participants.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tally_core::ledger::allocate_even;
/// use tally_shared::types::UserId;
///
/// let shares = allocate_even(dec!(100), &[UserId::new(1), UserId::new(2), UserId::new(3)]);
/// let amounts: Vec<_> = shares.iter().map(|s| s.amount).collect();
/// assert_eq!(amounts, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
/// ```
#[must_use]
pub fn allocate_even(total: Decimal, participants: &[UserId]) -> Vec<SplitAllocation> {
    if participants.is_empty() {
        return vec![];
    }

    let unit = Decimal::new(1, MONEY_SCALE);
    let total = total.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven);
    let count = Decimal::from(participants.len());

    let base = (total / count).round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::ToZero);
    let remainder = total - base * count;
    let extra_units = (remainder / unit).to_usize().unwrap_or(0);

    participants
        .iter()
        .enumerate()
        .map(|(i, user_id)| SplitAllocation {
            user_id: *user_id,
            amount: if i < extra_units { base + unit } else { base },
        })
        .collect()
}
