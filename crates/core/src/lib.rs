//! Core ledger rules for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! The storage layer in `tally-db` calls into these rules inside its atomic units.
//!
//! # Modules
//!
//! - `error` - The ledger error taxonomy and write outcomes
//! - `validation` - Input checks that run before any store access
//! - `ledger` - Transaction lifecycle, splits, balance projection and search filters
//! - `membership` - Group membership authorization
//! - `payment` - Payment method field rules
//! - `request` - Request lifecycle
//! - `notification` - Notification message composition

pub mod error;
pub mod ledger;
pub mod membership;
pub mod notification;
pub mod payment;
pub mod request;
pub mod validation;

pub use error::{LedgerError, LedgerResult, Reference, WriteOutcome};
