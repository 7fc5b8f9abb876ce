//! Property-based tests for split allocation and the split-sum rule.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{TransactionId, UserId};

use super::split::{allocate_even, check_split_fits};

/// Strategy to generate a money amount (0.01 to 1,000,000.00).
fn money() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn participants(max: i32) -> impl Strategy<Value = Vec<UserId>> {
    (1..=max).prop_map(|n| (1..=n).map(UserId::new).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Even shares always sum to the total.
    #[test]
    fn prop_even_allocation_sums_to_total(total in money(), users in participants(25)) {
        let shares = allocate_even(total, &users);
        let sum: Decimal = shares.iter().map(|s| s.amount).sum();
        prop_assert_eq!(sum, total);
        prop_assert_eq!(shares.len(), users.len());
    }

    /// No two shares differ by more than one cent, and earlier shares are never smaller.
    #[test]
    fn prop_even_allocation_is_fair(total in money(), users in participants(25)) {
        let shares = allocate_even(total, &users);
        let max = shares.iter().map(|s| s.amount).max().unwrap_or_default();
        let min = shares.iter().map(|s| s.amount).min().unwrap_or_default();
        prop_assert!(max - min <= Decimal::new(1, 2));
        for pair in shares.windows(2) {
            prop_assert!(pair[0].amount >= pair[1].amount);
        }
    }

    /// Accepted splits never push the running total past the transaction amount.
    #[test]
    fn prop_accepted_splits_never_exceed_amount(
        amount in money(),
        requests in prop::collection::vec(money(), 1..20),
    ) {
        let tx = TransactionId::new(1);
        let mut allocated = Decimal::ZERO;
        for requested in requests {
            if check_split_fits(tx, amount, allocated, requested).is_ok() {
                allocated += requested;
            }
            prop_assert!(allocated <= amount);
        }
    }
}
