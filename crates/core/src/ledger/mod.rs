//! Ledger rules for transactions, splits and balances.
//!
//! This module implements the pure side of the ledger:
//! - Transaction status state machine and creation input
//! - Transaction search filters
//! - Split-sum rule and even split allocation
//! - Balance projection over completed transactions

pub mod balance;
pub mod search;
pub mod split;
pub mod transaction;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod split_props;

pub use balance::{BalanceScope, BalanceTotals, Posting, project_balance};
pub use search::TransactionFilter;
pub use split::{
    SplitAllocation, allocate_even, check_even_share, check_split_fits, check_splits_complete,
    validate_participants,
};
pub use transaction::{NewTransaction, StatusChange, TransactionStatus};
