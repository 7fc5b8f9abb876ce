//! Transaction split writer.
//!
//! The split-sum rule is enforced at write time: the parent transaction is
//! locked exclusively, its existing splits are summed, and the insert is
//! rejected if the total would exceed the transaction amount. Concurrent
//! split writers on one transaction therefore serialize on the parent row.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tally_core::ledger::{
    TransactionStatus as CoreStatus, allocate_even, check_even_share, check_split_fits,
    validate_participants,
};
use tally_core::validation::{money, positive_amount, positive_id};
use tally_core::{LedgerError, LedgerResult};
use tally_shared::types::{TransactionId, UserId};
use tracing::{info, warn};

use crate::entities::{transaction_splits, transactions};
use crate::error::{commit, db_err};
use crate::repositories::references::{lock_transaction, require_user};

/// Transaction split repository.
#[derive(Debug, Clone)]
pub struct TransactionSplitRepository {
    db: DatabaseConnection,
}

impl TransactionSplitRepository {
    /// Creates a new transaction split repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Adds one participant's share to a pending transaction.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-positive amount or id,
    /// `ReferenceNotFound` for a missing transaction or user, `SplitsClosed`
    /// if the transaction is no longer pending, and `SplitExceedsAmount` if
    /// the splits would add up to more than the transaction amount.
    pub async fn create_transaction_split(
        &self,
        transaction: TransactionId,
        user: UserId,
        amount: Decimal,
    ) -> LedgerResult<transaction_splits::Model> {
        positive_id("transaction_id", transaction.get())?;
        positive_id("user_id", user.get())?;
        positive_amount("split amount", amount)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let parent = lock_open_transaction(&txn, transaction).await?;
        require_user(&txn, user).await?;

        let allocated = allocated_amount(&txn, transaction).await?;
        if let Err(e) = check_split_fits(transaction, money(parent.amount), allocated, amount) {
            warn!(transaction_id = %transaction, requested = %amount, "Split rejected");
            return Err(e);
        }

        let split = insert_split(&txn, transaction, user, amount).await?;

        commit(txn).await?;

        info!(
            split_id = split.id,
            transaction_id = %transaction,
            user_id = %user,
            amount = %amount,
            "Transaction split created"
        );
        Ok(split)
    }

    /// Splits the whole transaction amount evenly among `participants`.
    ///
    /// All shares are written in one atomic unit; the transaction must have
    /// no splits yet.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty or duplicated participant list
    /// or an amount below one cent per participant, `ReferenceNotFound` for a missing transaction or participant,
    /// `SplitsClosed` if the transaction is no longer pending, and
    /// `SplitExceedsAmount` if splits already exist.
    pub async fn create_even_splits(
        &self,
        transaction: TransactionId,
        participants: &[UserId],
    ) -> LedgerResult<Vec<transaction_splits::Model>> {
        positive_id("transaction_id", transaction.get())?;
        validate_participants(participants)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let parent = lock_open_transaction(&txn, transaction).await?;
        for user in participants {
            require_user(&txn, *user).await?;
        }

        let amount = money(parent.amount);
        check_even_share(amount, participants.len())?;
        let allocated = allocated_amount(&txn, transaction).await?;
        check_split_fits(transaction, amount, allocated, amount)?;

        let mut splits = Vec::with_capacity(participants.len());
        for share in allocate_even(amount, participants) {
            splits.push(insert_split(&txn, transaction, share.user_id, share.amount).await?);
        }

        commit(txn).await?;

        info!(
            transaction_id = %transaction,
            participants = participants.len(),
            "Even splits created"
        );
        Ok(splits)
    }

    /// Lists the splits of a transaction; empty if there are none.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn get_transaction_splits(
        &self,
        transaction: TransactionId,
    ) -> LedgerResult<Vec<transaction_splits::Model>> {
        transaction_splits::Entity::find()
            .filter(transaction_splits::Column::TransactionId.eq(transaction.get()))
            .order_by_asc(transaction_splits::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)
    }
}

/// Locks the parent transaction and fails unless it still takes splits.
async fn lock_open_transaction<C: ConnectionTrait>(
    conn: &C,
    id: TransactionId,
) -> LedgerResult<transactions::Model> {
    let parent = lock_transaction(conn, id).await?;
    let status = CoreStatus::from(parent.status);
    if !status.accepts_splits() {
        return Err(LedgerError::SplitsClosed {
            transaction: id,
            status: status.to_string(),
        });
    }
    Ok(parent)
}

/// Sums the splits already recorded for a transaction.
async fn allocated_amount<C: ConnectionTrait>(
    conn: &C,
    transaction: TransactionId,
) -> LedgerResult<Decimal> {
    let splits = transaction_splits::Entity::find()
        .filter(transaction_splits::Column::TransactionId.eq(transaction.get()))
        .all(conn)
        .await
        .map_err(db_err)?;

    Ok(splits.iter().map(|s| money(s.amount)).sum())
}

async fn insert_split<C: ConnectionTrait>(
    conn: &C,
    transaction: TransactionId,
    user: UserId,
    amount: Decimal,
) -> LedgerResult<transaction_splits::Model> {
    transaction_splits::ActiveModel {
        transaction_id: Set(transaction.get()),
        user_id: Set(user.get()),
        amount: Set(amount),
        created_at: Set(chrono::Utc::now().into()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(db_err)
}
