//! Reference validator.
//!
//! Existence checks for every entity another row can point at. The
//! `require_*` helpers run on the caller's transaction and take a shared row
//! lock (`FOR SHARE`), so the referenced row cannot disappear before the
//! dependent write commits. SQLite ignores the lock clause and serializes
//! writers instead.

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect,
};
use tally_core::{LedgerError, LedgerResult, Reference};
use tally_shared::types::{
    BalanceId, GroupId, GroupMemberId, PaymentMethodId, TransactionId, UserId,
};

use crate::entities::{
    balances, group_members, groups, payment_methods, transactions, users,
};
use crate::error::db_err;

/// Point-in-time existence checks.
///
/// A `true` result only says the row existed when the query ran. Writers in
/// this crate repeat the check inside their own atomic unit.
#[derive(Debug, Clone)]
pub struct ReferenceValidator {
    db: DatabaseConnection,
}

impl ReferenceValidator {
    /// Creates a new reference validator.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Checks whether a user exists.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn user_exists(&self, id: UserId) -> LedgerResult<bool> {
        let count = users::Entity::find_by_id(id.get())
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    /// Checks whether a group exists.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn group_exists(&self, id: GroupId) -> LedgerResult<bool> {
        let count = groups::Entity::find_by_id(id.get())
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    /// Checks whether a payment method exists.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn payment_method_exists(&self, id: PaymentMethodId) -> LedgerResult<bool> {
        let count = payment_methods::Entity::find_by_id(id.get())
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    /// Checks whether a transaction exists.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn transaction_exists(&self, id: TransactionId) -> LedgerResult<bool> {
        let count = transactions::Entity::find_by_id(id.get())
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    /// Checks whether a balance row exists.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn balance_exists(&self, id: BalanceId) -> LedgerResult<bool> {
        let count = balances::Entity::find_by_id(id.get())
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    /// Checks whether a membership row exists.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn group_member_exists(&self, id: GroupMemberId) -> LedgerResult<bool> {
        let count = group_members::Entity::find_by_id(id.get())
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }
}

/// Loads a user under a shared lock, failing if it is missing.
pub(crate) async fn require_user<C: ConnectionTrait>(
    conn: &C,
    id: UserId,
) -> LedgerResult<users::Model> {
    users::Entity::find_by_id(id.get())
        .lock_shared()
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(LedgerError::user_not_found(id))
}

/// Loads a user by email under a shared lock, failing if it is missing.
pub(crate) async fn require_user_by_email<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> LedgerResult<users::Model> {
    users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .lock_shared()
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| LedgerError::ReferenceNotFound(Reference::UserEmail(email.to_string())))
}

/// Loads a group under a shared lock, failing if it is missing.
pub(crate) async fn require_group<C: ConnectionTrait>(
    conn: &C,
    id: GroupId,
) -> LedgerResult<groups::Model> {
    groups::Entity::find_by_id(id.get())
        .lock_shared()
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(LedgerError::group_not_found(id))
}

/// Fails unless the payment method exists, locking it.
pub(crate) async fn require_payment_method<C: ConnectionTrait>(
    conn: &C,
    id: PaymentMethodId,
) -> LedgerResult<payment_methods::Model> {
    payment_methods::Entity::find_by_id(id.get())
        .lock_shared()
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(LedgerError::ReferenceNotFound(Reference::PaymentMethod(id)))
}

/// Loads a transaction under an exclusive lock, failing if it is missing.
///
/// Used by every writer that changes the transaction or its splits.
pub(crate) async fn lock_transaction<C: ConnectionTrait>(
    conn: &C,
    id: TransactionId,
) -> LedgerResult<transactions::Model> {
    transactions::Entity::find_by_id(id.get())
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(LedgerError::transaction_not_found(id))
}

/// Loads the membership row of `user` in `group` under an exclusive lock.
pub(crate) async fn lock_membership<C: ConnectionTrait>(
    conn: &C,
    group: GroupId,
    user: UserId,
) -> LedgerResult<Option<group_members::Model>> {
    group_members::Entity::find()
        .filter(group_members::Column::GroupId.eq(group.get()))
        .filter(group_members::Column::UserId.eq(user.get()))
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(db_err)
}
