//! Balance writer and reconciliation.
//!
//! Balance rows are a materialized projection of completed transactions.
//! Transaction writers call [`reconcile_scope`] inside their own atomic unit
//! whenever a status change or delete can move a balance; manual amount
//! updates stay possible and are overwritten by the next reconciliation.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Query,
};
use tally_core::ledger::{BalanceScope, BalanceTotals, Posting, SplitAllocation, project_balance};
use tally_core::validation::{money, non_negative_amount, positive_id};
use tally_core::{LedgerError, LedgerResult, Reference};
use tally_shared::types::{BalanceId, GroupId, UserId};
use tracing::{debug, info};

use crate::entities::{
    balances, sea_orm_active_enums::TransactionStatus, transaction_splits, transactions,
};
use crate::error::{commit, db_err};
use crate::repositories::references::{require_group, require_user};

/// Balance repository.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    db: DatabaseConnection,
}

impl BalanceRepository {
    /// Creates a new balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates the balance row of a (user, group) scope.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for negative amounts, `ReferenceNotFound`
    /// for a missing user or group, and `Conflict` if the scope already has
    /// a balance row.
    pub async fn create_balance(
        &self,
        user: UserId,
        group: Option<GroupId>,
        owed_amount: Decimal,
        lent_amount: Decimal,
    ) -> LedgerResult<balances::Model> {
        positive_id("user_id", user.get())?;
        if let Some(group) = group {
            positive_id("group_id", group.get())?;
        }
        non_negative_amount("owed_amount", owed_amount)?;
        non_negative_amount("lent_amount", lent_amount)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        require_user(&txn, user).await?;
        if let Some(group) = group {
            require_group(&txn, group).await?;
        }

        let scope = BalanceScope::new(user, group);
        if find_scope_row(&txn, scope).await?.is_some() {
            return Err(LedgerError::Conflict(format!(
                "balance for user {user} already exists in this scope"
            )));
        }

        let balance = balances::ActiveModel {
            user_id: Set(user.get()),
            group_id: Set(group.map(GroupId::get)),
            owed_amount: Set(owed_amount),
            lent_amount: Set(lent_amount),
            updated_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        commit(txn).await?;

        info!(balance_id = balance.id, user_id = %user, "Balance created");
        Ok(balance)
    }

    /// Updates the owed and/or lent amount. Absent amounts keep their value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if no amount is supplied or one is negative,
    /// and `ReferenceNotFound` if the balance does not exist.
    pub async fn update_balance_amounts(
        &self,
        id: BalanceId,
        owed_amount: Option<Decimal>,
        lent_amount: Option<Decimal>,
    ) -> LedgerResult<balances::Model> {
        if owed_amount.is_none() && lent_amount.is_none() {
            return Err(LedgerError::InvalidArgument(
                "nothing to update".to_string(),
            ));
        }
        if let Some(owed) = owed_amount {
            non_negative_amount("owed_amount", owed)?;
        }
        if let Some(lent) = lent_amount {
            non_negative_amount("lent_amount", lent)?;
        }

        let txn = self.db.begin().await.map_err(db_err)?;
        let balance = balances::Entity::find_by_id(id.get())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::ReferenceNotFound(Reference::Balance(id)))?;

        let mut active: balances::ActiveModel = balance.into();
        if let Some(owed) = owed_amount {
            active.owed_amount = Set(owed);
        }
        if let Some(lent) = lent_amount {
            active.lent_amount = Set(lent);
        }
        active.updated_at = Set(chrono::Utc::now().into());
        let balance = active.update(&txn).await.map_err(db_err)?;

        commit(txn).await?;

        info!(balance_id = balance.id, "Balance amounts updated");
        Ok(balance)
    }

    /// Finds a balance by ID.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn get_balance_by_id(&self, id: BalanceId) -> LedgerResult<Option<balances::Model>> {
        balances::Entity::find_by_id(id.get())
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Lists a user's balances across all scopes.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` if the user does not exist.
    pub async fn get_balances_by_user_id(&self, user: UserId) -> LedgerResult<Vec<balances::Model>> {
        require_user(&self.db, user).await?;

        balances::Entity::find()
            .filter(balances::Column::UserId.eq(user.get()))
            .order_by_asc(balances::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Lists the balances of a group.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` if the group does not exist.
    pub async fn get_balances_by_group_id(
        &self,
        group: GroupId,
    ) -> LedgerResult<Vec<balances::Model>> {
        require_group(&self.db, group).await?;

        balances::Entity::find()
            .filter(balances::Column::GroupId.eq(group.get()))
            .order_by_asc(balances::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Deletes a balance row.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` if the balance does not exist.
    pub async fn delete_balance(&self, id: BalanceId) -> LedgerResult<()> {
        let result = balances::Entity::delete_by_id(id.get())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(LedgerError::ReferenceNotFound(Reference::Balance(id)));
        }
        info!(balance_id = %id, "Balance deleted");
        Ok(())
    }

    /// Recomputes a scope's balance row from its completed transactions.
    ///
    /// Creates the row if the scope has none.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` for a missing user or group.
    pub async fn reconcile_balances(
        &self,
        user: UserId,
        group: Option<GroupId>,
    ) -> LedgerResult<balances::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;
        require_user(&txn, user).await?;
        if let Some(group) = group {
            require_group(&txn, group).await?;
        }

        let balance = reconcile_scope(&txn, BalanceScope::new(user, group)).await?;
        commit(txn).await?;

        Ok(balance)
    }
}

/// Finds the balance row of a scope.
async fn find_scope_row<C: ConnectionTrait>(
    conn: &C,
    scope: BalanceScope,
) -> LedgerResult<Option<balances::Model>> {
    let group_condition = match scope.group_id {
        Some(group) => balances::Column::GroupId.eq(group.get()),
        None => balances::Column::GroupId.is_null(),
    };
    balances::Entity::find()
        .filter(balances::Column::UserId.eq(scope.user_id.get()))
        .filter(group_condition)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(db_err)
}

/// Loads the completed transactions of a scope that involve its user.
async fn load_postings<C: ConnectionTrait>(
    conn: &C,
    scope: BalanceScope,
) -> LedgerResult<Vec<Posting>> {
    let user = scope.user_id.get();
    let group_condition = match scope.group_id {
        Some(group) => transactions::Column::GroupId.eq(group.get()),
        None => transactions::Column::GroupId.is_null(),
    };
    let split_of_user = Query::select()
        .column(transaction_splits::Column::TransactionId)
        .from(transaction_splits::Entity)
        .and_where(transaction_splits::Column::UserId.eq(user))
        .to_owned();

    let rows = transactions::Entity::find()
        .filter(transactions::Column::Status.eq(TransactionStatus::Completed))
        .filter(group_condition)
        .filter(
            Condition::any()
                .add(transactions::Column::LenderId.eq(user))
                .add(transactions::Column::BorrowerId.eq(user))
                .add(transactions::Column::Id.in_subquery(split_of_user)),
        )
        .all(conn)
        .await
        .map_err(db_err)?;

    let ids: Vec<i32> = rows.iter().map(|t| t.id).collect();
    let mut splits_by_tx: HashMap<i32, Vec<SplitAllocation>> = HashMap::new();
    if !ids.is_empty() {
        let splits = transaction_splits::Entity::find()
            .filter(transaction_splits::Column::TransactionId.is_in(ids))
            .all(conn)
            .await
            .map_err(db_err)?;
        for split in splits {
            splits_by_tx
                .entry(split.transaction_id)
                .or_default()
                .push(SplitAllocation {
                    user_id: UserId::new(split.user_id),
                    amount: money(split.amount),
                });
        }
    }

    Ok(rows
        .into_iter()
        .map(|t| Posting {
            lender_id: UserId::new(t.lender_id),
            borrower_id: UserId::new(t.borrower_id),
            group_id: t.group_id.map(GroupId::new),
            amount: money(t.amount),
            status: t.status.into(),
            splits: splits_by_tx.remove(&t.id).unwrap_or_default(),
        })
        .collect())
}

/// Recomputes and stores the balance row of `scope` on `conn`.
pub(crate) async fn reconcile_scope<C: ConnectionTrait>(
    conn: &C,
    scope: BalanceScope,
) -> LedgerResult<balances::Model> {
    let postings = load_postings(conn, scope).await?;
    let BalanceTotals { owed, lent } = project_balance(scope, &postings);
    let now = chrono::Utc::now();

    let balance = match find_scope_row(conn, scope).await? {
        Some(existing) => {
            let mut active: balances::ActiveModel = existing.into();
            active.owed_amount = Set(owed);
            active.lent_amount = Set(lent);
            active.updated_at = Set(now.into());
            active.update(conn).await.map_err(db_err)?
        }
        None => balances::ActiveModel {
            user_id: Set(scope.user_id.get()),
            group_id: Set(scope.group_id.map(GroupId::get)),
            owed_amount: Set(owed),
            lent_amount: Set(lent),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(db_err)?,
    };

    debug!(
        user_id = %scope.user_id,
        group_id = ?scope.group_id,
        owed = %owed,
        lent = %lent,
        "Balance reconciled"
    );
    Ok(balance)
}

/// Reconciles every scope in `scopes` on `conn`.
pub(crate) async fn reconcile_scopes<C: ConnectionTrait>(
    conn: &C,
    scopes: impl IntoIterator<Item = BalanceScope>,
) -> LedgerResult<()> {
    for scope in scopes {
        reconcile_scope(conn, scope).await?;
    }
    Ok(())
}
