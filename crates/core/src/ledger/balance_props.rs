//! Property-based tests for the balance projection.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{GroupId, UserId};

use super::balance::{BalanceScope, Posting, project_balance};
use super::split::allocate_even;
use super::transaction::TransactionStatus;

const USERS: i32 = 5;

fn user() -> impl Strategy<Value = UserId> {
    (1..=USERS).prop_map(UserId::new)
}

fn status() -> impl Strategy<Value = TransactionStatus> {
    prop_oneof![
        Just(TransactionStatus::Pending),
        Just(TransactionStatus::Completed),
        Just(TransactionStatus::Failed),
    ]
}

fn posting() -> impl Strategy<Value = Posting> {
    (
        user(),
        user(),
        (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2)),
        status(),
        prop::option::of((1..=3i32).prop_map(GroupId::new)),
        0..=3usize,
    )
        .prop_map(|(lender, borrower, amount, status, group_id, n_splits)| {
            let participants: Vec<UserId> = (1..=USERS).map(UserId::new).take(n_splits).collect();
            Posting {
                lender_id: lender,
                borrower_id: borrower,
                group_id,
                amount,
                status,
                splits: allocate_even(amount, &participants),
            }
        })
}

fn scopes() -> Vec<BalanceScope> {
    let groups = [None, Some(GroupId::new(1)), Some(GroupId::new(2)), Some(GroupId::new(3))];
    (1..=USERS)
        .flat_map(|u| groups.iter().map(move |g| BalanceScope::new(UserId::new(u), *g)))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Across all users, total owed equals total lent.
    #[test]
    fn prop_owed_matches_lent(postings in prop::collection::vec(posting(), 0..30)) {
        let mut owed = Decimal::ZERO;
        let mut lent = Decimal::ZERO;
        for scope in scopes() {
            let totals = project_balance(scope, &postings);
            prop_assert!(totals.owed >= Decimal::ZERO);
            prop_assert!(totals.lent >= Decimal::ZERO);
            owed += totals.owed;
            lent += totals.lent;
        }
        prop_assert_eq!(owed, lent);
    }

    /// Non-completed postings never move a balance.
    #[test]
    fn prop_unsettled_postings_ignored(postings in prop::collection::vec(posting(), 0..30)) {
        let settled: Vec<Posting> = postings
            .iter()
            .filter(|p| p.status == TransactionStatus::Completed)
            .cloned()
            .collect();
        for scope in scopes() {
            prop_assert_eq!(project_balance(scope, &postings), project_balance(scope, &settled));
        }
    }
}
