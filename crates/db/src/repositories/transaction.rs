//! Transaction writer.
//!
//! Creation checks every reference on the inserting transaction. Status
//! changes and deletes that touch a completed transaction reconcile the
//! balances of every affected scope before committing.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tally_core::ledger::{
    NewTransaction, Posting, SplitAllocation, TransactionFilter,
    TransactionStatus as CoreStatus, check_splits_complete,
};
use tally_core::validation::{money, non_empty};
use tally_core::{LedgerError, LedgerResult};
use tally_shared::types::{GroupId, PaymentMethodId, TransactionId, UserId};
use tracing::{info, warn};

use crate::entities::{
    sea_orm_active_enums::TransactionStatus, transaction_splits, transactions,
};
use crate::error::{commit, db_err};
use crate::repositories::balance::reconcile_scopes;
use crate::repositories::references::{
    lock_transaction, require_group, require_payment_method, require_user,
};

/// Transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a pending transaction.
    ///
    /// References are checked in order: lender, borrower, group, payment
    /// method. The first missing one is reported and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-positive amount or id, and
    /// `ReferenceNotFound` naming the first missing reference.
    pub async fn create_transaction(
        &self,
        input: NewTransaction,
    ) -> LedgerResult<transactions::Model> {
        let input = input.validated()?;

        let txn = self.db.begin().await.map_err(db_err)?;
        require_user(&txn, input.lender_id).await?;
        require_user(&txn, input.borrower_id).await?;
        if let Some(group) = input.group_id {
            require_group(&txn, group).await?;
        }
        if let Some(method) = input.payment_method_id {
            require_payment_method(&txn, method).await?;
        }

        let now = chrono::Utc::now();
        let transaction = transactions::ActiveModel {
            lender_id: Set(input.lender_id.get()),
            borrower_id: Set(input.borrower_id.get()),
            group_id: Set(input.group_id.map(GroupId::get)),
            amount: Set(input.amount),
            status: Set(TransactionStatus::Pending),
            purpose: Set(input.purpose),
            payment_method_id: Set(input.payment_method_id.map(PaymentMethodId::get)),
            retry_count: Set(0),
            failure_reason: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        commit(txn).await?;

        info!(
            transaction_id = transaction.id,
            lender_id = transaction.lender_id,
            borrower_id = transaction.borrower_id,
            amount = %transaction.amount,
            "Transaction created"
        );
        Ok(transaction)
    }

    /// Moves a transaction to `status`.
    ///
    /// A retry (`failed -> pending`) increments the retry count and clears
    /// the failure reason.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` if the transaction does not exist,
    /// `InvalidTransition` if the status change is not allowed, and
    /// `SplitsIncomplete` when completing a transaction whose splits do not
    /// cover its amount.
    pub async fn update_transaction_status(
        &self,
        id: TransactionId,
        status: CoreStatus,
    ) -> LedgerResult<transactions::Model> {
        self.change_status(id, status, None).await
    }

    /// Marks a pending transaction failed with a reason.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a blank reason, `ReferenceNotFound` if
    /// the transaction does not exist and `InvalidTransition` unless it is
    /// pending.
    pub async fn mark_transaction_failed(
        &self,
        id: TransactionId,
        reason: &str,
    ) -> LedgerResult<transactions::Model> {
        let reason = non_empty("failure reason", reason)?;
        self.change_status(id, CoreStatus::Failed, Some(reason.to_string()))
            .await
    }

    async fn change_status(
        &self,
        id: TransactionId,
        status: CoreStatus,
        failure_reason: Option<String>,
    ) -> LedgerResult<transactions::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let current = lock_transaction(&txn, id).await?;
        let change = CoreStatus::from(current.status).transition(status)?;

        let posting = posting_of(&txn, &current).await?;
        if change.to == CoreStatus::Completed {
            let allocated: Decimal = posting.splits.iter().map(|s| s.amount).sum();
            if let Err(e) = check_splits_complete(id, posting.amount, allocated) {
                warn!(transaction_id = %id, allocated = %allocated, "Completion rejected");
                return Err(e);
            }
        }
        let retry_count = current.retry_count;

        let mut active: transactions::ActiveModel = current.into();
        active.status = Set(status.into());
        if change.is_retry() {
            active.retry_count = Set(retry_count.saturating_add(1));
            active.failure_reason = Set(None);
        } else if failure_reason.is_some() {
            active.failure_reason = Set(failure_reason);
        }
        active.updated_at = Set(chrono::Utc::now().into());
        let transaction = active.update(&txn).await.map_err(db_err)?;

        if change.affects_balances() {
            reconcile_scopes(&txn, posting.affected_scopes()).await?;
        }

        commit(txn).await?;

        info!(
            transaction_id = %id,
            from = %change.from,
            to = %change.to,
            retry_count = transaction.retry_count,
            "Transaction status changed"
        );
        Ok(transaction)
    }

    /// Deletes a transaction and its splits.
    ///
    /// Deleting a completed transaction reconciles the balances it touched.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` if the transaction does not exist.
    pub async fn delete_transaction(&self, id: TransactionId) -> LedgerResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let current = lock_transaction(&txn, id).await?;
        let posting = posting_of(&txn, &current).await?;

        transaction_splits::Entity::delete_many()
            .filter(transaction_splits::Column::TransactionId.eq(id.get()))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        let result = current.delete(&txn).await.map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(LedgerError::transaction_not_found(id));
        }

        if posting.status.counts_toward_balance() {
            reconcile_scopes(&txn, posting.affected_scopes()).await?;
        }

        commit(txn).await?;

        info!(transaction_id = %id, "Transaction deleted");
        Ok(())
    }

    /// Finds a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn get_transaction_by_id(
        &self,
        id: TransactionId,
    ) -> LedgerResult<Option<transactions::Model>> {
        transactions::Entity::find_by_id(id.get())
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Lists the transactions a user lent.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` if the user does not exist.
    pub async fn get_transactions_by_lender_id(
        &self,
        lender: UserId,
    ) -> LedgerResult<Vec<transactions::Model>> {
        require_user(&self.db, lender).await?;

        transactions::Entity::find()
            .filter(transactions::Column::LenderId.eq(lender.get()))
            .order_by_asc(transactions::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Lists the transactions a user borrowed.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` if the user does not exist.
    pub async fn get_transactions_by_borrower_id(
        &self,
        borrower: UserId,
    ) -> LedgerResult<Vec<transactions::Model>> {
        require_user(&self.db, borrower).await?;

        transactions::Entity::find()
            .filter(transactions::Column::BorrowerId.eq(borrower.get()))
            .order_by_asc(transactions::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Searches transactions. Set criteria are ANDed; unset ones match all.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the filter is empty or inconsistent.
    pub async fn search_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> LedgerResult<Vec<transactions::Model>> {
        filter.validate()?;

        let mut query = transactions::Entity::find();

        if let Some(lender) = filter.lender_id {
            query = query.filter(transactions::Column::LenderId.eq(lender.get()));
        }
        if let Some(borrower) = filter.borrower_id {
            query = query.filter(transactions::Column::BorrowerId.eq(borrower.get()));
        }
        if let Some(group) = filter.group_id {
            query = query.filter(transactions::Column::GroupId.eq(group.get()));
        }
        if let Some(status) = filter.status {
            query = query.filter(transactions::Column::Status.eq(TransactionStatus::from(status)));
        }
        if let Some(min) = filter.min_amount {
            query = query.filter(transactions::Column::Amount.gte(min));
        }
        if let Some(max) = filter.max_amount {
            query = query.filter(transactions::Column::Amount.lte(max));
        }
        if let Some(method) = filter.payment_method_id {
            query = query.filter(transactions::Column::PaymentMethodId.eq(method.get()));
        }

        query
            .order_by_asc(transactions::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)
    }
}

/// Builds the balance posting of a stored transaction, splits included.
pub(crate) async fn posting_of<C: ConnectionTrait>(
    conn: &C,
    transaction: &transactions::Model,
) -> LedgerResult<Posting> {
    let splits = transaction_splits::Entity::find()
        .filter(transaction_splits::Column::TransactionId.eq(transaction.id))
        .all(conn)
        .await
        .map_err(db_err)?;

    Ok(Posting {
        lender_id: UserId::new(transaction.lender_id),
        borrower_id: UserId::new(transaction.borrower_id),
        group_id: transaction.group_id.map(GroupId::new),
        amount: money(transaction.amount),
        status: transaction.status.into(),
        splits: splits
            .into_iter()
            .map(|s| SplitAllocation {
                user_id: UserId::new(s.user_id),
                amount: money(s.amount),
            })
            .collect(),
    })
}
