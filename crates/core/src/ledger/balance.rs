//! Balance projection.
//!
//! A balance is derived from completed transactions in one scope
//! (a user, and either one group or no group):
//! - `owed` is what the user owes other lenders
//! - `lent` is what other participants owe the user
//!
//! A transaction's shares are its splits; a transaction without splits
//! charges its whole amount to the borrower. The lender's own share is
//! never counted.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{GroupId, UserId};

use super::split::SplitAllocation;
use super::transaction::TransactionStatus;

/// The (user, group) key of a balance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BalanceScope {
    /// Balance owner.
    pub user_id: UserId,
    /// Group, or `None` for transactions outside any group.
    pub group_id: Option<GroupId>,
}

impl BalanceScope {
    /// Creates a scope.
    #[must_use]
    pub const fn new(user_id: UserId, group_id: Option<GroupId>) -> Self {
        Self { user_id, group_id }
    }
}

/// A transaction as seen by the projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    /// User who paid.
    pub lender_id: UserId,
    /// User who owes when there are no splits.
    pub borrower_id: UserId,
    /// Group of the transaction.
    pub group_id: Option<GroupId>,
    /// Transaction amount.
    pub amount: Decimal,
    /// Current status.
    pub status: TransactionStatus,
    /// Splits, possibly empty.
    pub splits: Vec<SplitAllocation>,
}

impl Posting {
    /// Returns each participant's share.
    #[must_use]
    pub fn shares(&self) -> Vec<(UserId, Decimal)> {
        if self.splits.is_empty() {
            return vec![(self.borrower_id, self.amount)];
        }
        self.splits.iter().map(|s| (s.user_id, s.amount)).collect()
    }

    /// Returns every balance scope this posting can change.
    #[must_use]
    pub fn affected_scopes(&self) -> BTreeSet<BalanceScope> {
        let mut users = BTreeSet::from([self.lender_id, self.borrower_id]);
        users.extend(self.splits.iter().map(|s| s.user_id));
        users
            .into_iter()
            .map(|user_id| BalanceScope::new(user_id, self.group_id))
            .collect()
    }
}

/// Owed and lent totals of a scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceTotals {
    /// Amount the user owes.
    pub owed: Decimal,
    /// Amount owed to the user.
    pub lent: Decimal,
}

impl BalanceTotals {
    /// Lent minus owed.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.lent - self.owed
    }
}

/// Folds `postings` into the totals of `scope`.
///
/// Postings outside the scope's group, and postings that are not completed,
/// are ignored.
#[must_use]
pub fn project_balance<'a>(
    scope: BalanceScope,
    postings: impl IntoIterator<Item = &'a Posting>,
) -> BalanceTotals {
    postings
        .into_iter()
        .filter(|p| p.group_id == scope.group_id && p.status.counts_toward_balance())
        .fold(BalanceTotals::default(), |mut totals, posting| {
            for (user_id, share) in posting.shares() {
                if user_id == posting.lender_id {
                    continue;
                }
                if user_id == scope.user_id {
                    totals.owed += share;
                }
                if posting.lender_id == scope.user_id {
                    totals.lent += share;
                }
            }
            totals
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const A: UserId = UserId::new(1);
    const B: UserId = UserId::new(2);
    const C: UserId = UserId::new(3);
    const TRIP: GroupId = GroupId::new(10);

    fn posting(lender: UserId, borrower: UserId, amount: Decimal) -> Posting {
        Posting {
            lender_id: lender,
            borrower_id: borrower,
            group_id: Some(TRIP),
            amount,
            status: TransactionStatus::Completed,
            splits: vec![],
        }
    }

    fn split(user_id: UserId, amount: Decimal) -> SplitAllocation {
        SplitAllocation { user_id, amount }
    }

    #[test]
    fn test_unsplit_transaction_charges_borrower() {
        let postings = vec![posting(A, B, dec!(100))];

        let a = project_balance(BalanceScope::new(A, Some(TRIP)), &postings);
        assert_eq!(a, BalanceTotals { owed: dec!(0), lent: dec!(100) });

        let b = project_balance(BalanceScope::new(B, Some(TRIP)), &postings);
        assert_eq!(b, BalanceTotals { owed: dec!(100), lent: dec!(0) });
    }

    #[test]
    fn test_splits_replace_borrower_share() {
        let mut p = posting(A, B, dec!(90));
        p.splits = vec![split(A, dec!(30)), split(B, dec!(30)), split(C, dec!(30))];
        let postings = vec![p];

        let a = project_balance(BalanceScope::new(A, Some(TRIP)), &postings);
        assert_eq!(a.lent, dec!(60));
        assert_eq!(a.owed, dec!(0));

        let c = project_balance(BalanceScope::new(C, Some(TRIP)), &postings);
        assert_eq!(c.owed, dec!(30));
        assert_eq!(c.net(), dec!(-30));
    }

    #[test]
    fn test_only_completed_transactions_count() {
        let mut pending = posting(A, B, dec!(50));
        pending.status = TransactionStatus::Pending;
        let mut failed = posting(A, B, dec!(20));
        failed.status = TransactionStatus::Failed;
        let postings = vec![pending, failed, posting(B, A, dec!(5))];

        let a = project_balance(BalanceScope::new(A, Some(TRIP)), &postings);
        assert_eq!(a, BalanceTotals { owed: dec!(5), lent: dec!(0) });
    }

    #[test]
    fn test_scope_separates_groups() {
        let mut outside = posting(A, B, dec!(40));
        outside.group_id = None;
        let postings = vec![outside, posting(A, B, dec!(10))];

        let grouped = project_balance(BalanceScope::new(A, Some(TRIP)), &postings);
        let ungrouped = project_balance(BalanceScope::new(A, None), &postings);
        assert_eq!(grouped.lent, dec!(10));
        assert_eq!(ungrouped.lent, dec!(40));
    }

    #[test]
    fn test_self_transaction_is_neutral() {
        let postings = vec![posting(A, A, dec!(25))];
        let a = project_balance(BalanceScope::new(A, Some(TRIP)), &postings);
        assert_eq!(a, BalanceTotals::default());
    }

    #[test]
    fn test_affected_scopes_include_split_users() {
        let mut p = posting(A, B, dec!(90));
        p.splits = vec![split(C, dec!(90))];
        let scopes = p.affected_scopes();
        assert_eq!(scopes.len(), 3);
        assert!(scopes.contains(&BalanceScope::new(C, Some(TRIP))));
    }
}
