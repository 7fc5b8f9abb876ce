//! Ledger error taxonomy.
//!
//! Every ledger operation fails with a [`LedgerError`]. Errors carry enough
//! structure for a caller to tell whether anything was written; see
//! [`LedgerError::outcome`].

use std::fmt;

use rust_decimal::Decimal;
use tally_shared::types::{
    BalanceId, GroupId, GroupMemberId, PaymentMethodId, RequestId, TransactionId, UserId,
};
use thiserror::Error;

use crate::payment::PaymentType;

/// Result alias used across the ledger.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// The entity a failed lookup or mutation referred to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// A user by id.
    User(UserId),
    /// A user by email address.
    UserEmail(String),
    /// A group.
    Group(GroupId),
    /// A group membership row.
    GroupMember(GroupMemberId),
    /// A payment method by id.
    PaymentMethod(PaymentMethodId),
    /// A payment method by owner email and type.
    PaymentMethodOfType {
        /// Owner email.
        email: String,
        /// Payment type.
        payment_type: PaymentType,
    },
    /// A transaction.
    Transaction(TransactionId),
    /// A balance row.
    Balance(BalanceId),
    /// A payment request.
    Request(RequestId),
}

impl Reference {
    /// Returns the entity kind as a lowercase noun.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::User(_) | Self::UserEmail(_) => "user",
            Self::Group(_) => "group",
            Self::GroupMember(_) => "group member",
            Self::PaymentMethod(_) | Self::PaymentMethodOfType { .. } => "payment method",
            Self::Transaction(_) => "transaction",
            Self::Balance(_) => "balance",
            Self::Request(_) => "request",
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user {id}"),
            Self::UserEmail(email) => write!(f, "user with email {email}"),
            Self::Group(id) => write!(f, "group {id}"),
            Self::GroupMember(id) => write!(f, "group member {id}"),
            Self::PaymentMethod(id) => write!(f, "payment method {id}"),
            Self::PaymentMethodOfType {
                email,
                payment_type,
            } => write!(f, "{payment_type} payment method of {email}"),
            Self::Transaction(id) => write!(f, "transaction {id}"),
            Self::Balance(id) => write!(f, "balance {id}"),
            Self::Request(id) => write!(f, "request {id}"),
        }
    }
}

/// What a failed operation left behind in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Rejected before any write was attempted.
    NothingApplied,
    /// A write was attempted and its atomic unit was rolled back.
    RolledBack,
    /// The commit itself failed; the write may or may not be durable.
    Unknown,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Malformed or out-of-range input, caught before any I/O.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced entity does not exist.
    #[error("{0} not found")]
    ReferenceNotFound(Reference),

    // ========== Membership Errors ==========
    /// The actor may not perform the requested mutation.
    #[error("User {actor} is not authorized to manage group {group}")]
    NotAuthorized {
        /// The acting user.
        actor: UserId,
        /// The group being modified.
        group: GroupId,
    },

    /// The user is not a member of the group.
    #[error("User {user} is not a member of group {group}")]
    NotMember {
        /// The group.
        group: GroupId,
        /// The user.
        user: UserId,
    },

    /// The user already belongs to the group.
    #[error("User {user} is already a member of group {group}")]
    AlreadyMember {
        /// The group.
        group: GroupId,
        /// The user.
        user: UserId,
    },

    /// The row vanished between the membership check and the delete.
    #[error("Nothing deleted: {0} was already removed")]
    NoOpDeletion(Reference),

    // ========== Lifecycle Errors ==========
    /// Status change not allowed by the entity's state machine.
    #[error("Invalid {entity} status transition from {from} to {to}")]
    InvalidTransition {
        /// Entity kind ("transaction" or "request").
        entity: &'static str,
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    // ========== Split Errors ==========
    /// Splits would add up to more than the transaction amount.
    #[error(
        "Split of {requested} exceeds transaction {transaction}: amount {amount}, already allocated {allocated}"
    )]
    SplitExceedsAmount {
        /// Parent transaction.
        transaction: TransactionId,
        /// Transaction amount.
        amount: Decimal,
        /// Sum of existing splits.
        allocated: Decimal,
        /// Amount of the rejected split.
        requested: Decimal,
    },

    /// Splits can only be written while the transaction is pending.
    #[error("Transaction {transaction} is {status}; splits can no longer change")]
    SplitsClosed {
        /// Parent transaction.
        transaction: TransactionId,
        /// Its current status.
        status: String,
    },

    /// Splits exist but do not cover the whole transaction amount.
    #[error(
        "Transaction {transaction} cannot complete: splits cover {allocated} of {amount}"
    )]
    SplitsIncomplete {
        /// Parent transaction.
        transaction: TransactionId,
        /// Transaction amount.
        amount: Decimal,
        /// Sum of its splits.
        allocated: Decimal,
    },

    // ========== Store Errors ==========
    /// A write unit failed after validation passed (constraint violation).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store was unreachable or the query failed.
    #[error("Storage error: {0}")]
    Transport(String),

    /// The commit failed; the write may have been applied.
    #[error("Commit outcome unknown: {0}")]
    CommitUncertain(String),
}

impl LedgerError {
    /// Shorthand for a missing user.
    #[must_use]
    pub const fn user_not_found(id: UserId) -> Self {
        Self::ReferenceNotFound(Reference::User(id))
    }

    /// Shorthand for a missing group.
    #[must_use]
    pub const fn group_not_found(id: GroupId) -> Self {
        Self::ReferenceNotFound(Reference::Group(id))
    }

    /// Shorthand for a missing transaction.
    #[must_use]
    pub const fn transaction_not_found(id: TransactionId) -> Self {
        Self::ReferenceNotFound(Reference::Transaction(id))
    }

    /// Returns the missing reference, if this is a not-found error.
    #[must_use]
    pub const fn missing_reference(&self) -> Option<&Reference> {
        match self {
            Self::ReferenceNotFound(reference) => Some(reference),
            _ => None,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::ReferenceNotFound(reference) => match reference {
                Reference::User(_) | Reference::UserEmail(_) => "USER_NOT_FOUND",
                Reference::Group(_) => "GROUP_NOT_FOUND",
                Reference::GroupMember(_) => "GROUP_MEMBER_NOT_FOUND",
                Reference::PaymentMethod(_) | Reference::PaymentMethodOfType { .. } => {
                    "PAYMENT_METHOD_NOT_FOUND"
                }
                Reference::Transaction(_) => "TRANSACTION_NOT_FOUND",
                Reference::Balance(_) => "BALANCE_NOT_FOUND",
                Reference::Request(_) => "REQUEST_NOT_FOUND",
            },
            Self::NotAuthorized { .. } => "NOT_AUTHORIZED",
            Self::NotMember { .. } => "NOT_MEMBER",
            Self::AlreadyMember { .. } => "ALREADY_MEMBER",
            Self::NoOpDeletion(_) => "NO_OP_DELETION",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::SplitExceedsAmount { .. } => "SPLIT_EXCEEDS_AMOUNT",
            Self::SplitsClosed { .. } => "SPLITS_CLOSED",
            Self::SplitsIncomplete { .. } => "SPLITS_INCOMPLETE",
            Self::Conflict(_) => "CONFLICT",
            Self::Transport(_) => "STORAGE_ERROR",
            Self::CommitUncertain(_) => "COMMIT_UNCERTAIN",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidArgument(_) | Self::InvalidTransition { .. } => 400,
            Self::NotAuthorized { .. } => 403,
            Self::ReferenceNotFound(_) | Self::NotMember { .. } => 404,
            Self::AlreadyMember { .. }
            | Self::NoOpDeletion(_)
            | Self::SplitsClosed { .. }
            | Self::Conflict(_) => 409,
            Self::SplitExceedsAmount { .. } | Self::SplitsIncomplete { .. } => 422,
            Self::CommitUncertain(_) => 500,
            Self::Transport(_) => 503,
        }
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Describes what the failed operation left in the store.
    #[must_use]
    pub const fn outcome(&self) -> WriteOutcome {
        match self {
            Self::Conflict(_) | Self::Transport(_) => WriteOutcome::RolledBack,
            Self::CommitUncertain(_) => WriteOutcome::Unknown,
            _ => WriteOutcome::NothingApplied,
        }
    }
}
