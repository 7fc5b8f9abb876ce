//! Payment method store.
//!
//! Methods are addressed by owner email and type; an owner holds at most one
//! method of each type. At most one of an owner's methods is primary.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use tally_core::payment::{PaymentDetails, PaymentDetailsPatch, PaymentType as CorePaymentType};
use tally_core::validation::email as valid_email;
use tally_core::{LedgerError, LedgerResult, Reference};
use tally_shared::types::PaymentMethodId;
use tracing::info;

use crate::entities::{payment_methods, sea_orm_active_enums::PaymentType};
use crate::error::{commit, db_err};
use crate::repositories::references::require_user_by_email;

/// Payment method repository.
#[derive(Debug, Clone)]
pub struct PaymentMethodRepository {
    db: DatabaseConnection,
}

impl PaymentMethodRepository {
    /// Creates a new payment method repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Adds a payment method for the user with `email`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the details do not match the type,
    /// `ReferenceNotFound` if the owner does not exist, and `Conflict` if the
    /// owner already has a method of this type.
    pub async fn create_payment_method(
        &self,
        email: &str,
        payment_type: CorePaymentType,
        details: PaymentDetails,
    ) -> LedgerResult<payment_methods::Model> {
        let email = valid_email(email)?;
        let details = details.normalized();
        details.validate_for(payment_type)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let owner = require_user_by_email(&txn, email).await?;

        if details.is_primary {
            clear_primary(&txn, owner.id, None).await?;
        }

        let method = payment_methods::ActiveModel {
            user_id: Set(owner.id),
            payment_type: Set(payment_type.into()),
            upi_id: Set(details.upi_id),
            account_number: Set(details.account_number),
            routing_code: Set(details.routing_code),
            wallet_provider: Set(details.wallet_provider),
            is_primary: Set(details.is_primary),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        commit(txn).await?;

        info!(
            payment_method_id = method.id,
            user_id = owner.id,
            payment_type = %payment_type,
            "Payment method created"
        );
        Ok(method)
    }

    /// Lists the payment methods of the user with `email`.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` if the owner does not exist.
    pub async fn get_payment_methods(
        &self,
        email: &str,
    ) -> LedgerResult<Vec<payment_methods::Model>> {
        let owner = require_user_by_email(&self.db, email.trim()).await?;

        payment_methods::Entity::find()
            .filter(payment_methods::Column::UserId.eq(owner.id))
            .order_by_asc(payment_methods::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Finds a payment method by ID.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn get_payment_method_by_id(
        &self,
        id: PaymentMethodId,
    ) -> LedgerResult<Option<payment_methods::Model>> {
        payment_methods::Entity::find_by_id(id.get())
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Applies a partial update to the owner's method of `payment_type`.
    ///
    /// The merged record must still satisfy the type's field rule.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty patch or an invalid merged
    /// record, and `ReferenceNotFound` if the owner or the method is missing.
    pub async fn update_payment_method(
        &self,
        email: &str,
        payment_type: CorePaymentType,
        patch: PaymentDetailsPatch,
    ) -> LedgerResult<payment_methods::Model> {
        if patch.is_empty() {
            return Err(LedgerError::InvalidArgument(
                "nothing to update".to_string(),
            ));
        }
        let email = email.trim();

        let txn = self.db.begin().await.map_err(db_err)?;
        let owner = require_user_by_email(&txn, email).await?;

        let current = payment_methods::Entity::find()
            .filter(payment_methods::Column::UserId.eq(owner.id))
            .filter(payment_methods::Column::PaymentType.eq(PaymentType::from(payment_type)))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| {
                LedgerError::ReferenceNotFound(Reference::PaymentMethodOfType {
                    email: email.to_string(),
                    payment_type,
                })
            })?;

        let merged = patch.apply(details_of(&current)).normalized();
        merged.validate_for(payment_type)?;

        if patch.is_primary == Some(true) {
            clear_primary(&txn, owner.id, Some(current.id)).await?;
        }

        let mut active: payment_methods::ActiveModel = current.into();
        active.upi_id = Set(merged.upi_id);
        active.account_number = Set(merged.account_number);
        active.routing_code = Set(merged.routing_code);
        active.wallet_provider = Set(merged.wallet_provider);
        active.is_primary = Set(merged.is_primary);
        let method = active.update(&txn).await.map_err(db_err)?;

        commit(txn).await?;

        info!(payment_method_id = method.id, "Payment method updated");
        Ok(method)
    }

    /// Deletes the owner's method of `payment_type`.
    ///
    /// Transactions that referenced it keep their row with the reference cleared.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` if the owner or the method is missing.
    pub async fn delete_payment_method(
        &self,
        payment_type: CorePaymentType,
        email: &str,
    ) -> LedgerResult<()> {
        let email = email.trim();

        let txn = self.db.begin().await.map_err(db_err)?;
        let owner = require_user_by_email(&txn, email).await?;

        let result = payment_methods::Entity::delete_many()
            .filter(payment_methods::Column::UserId.eq(owner.id))
            .filter(payment_methods::Column::PaymentType.eq(PaymentType::from(payment_type)))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(LedgerError::ReferenceNotFound(
                Reference::PaymentMethodOfType {
                    email: email.to_string(),
                    payment_type,
                },
            ));
        }

        commit(txn).await?;

        info!(user_id = owner.id, payment_type = %payment_type, "Payment method deleted");
        Ok(())
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
}

fn details_of(method: &payment_methods::Model) -> PaymentDetails {
    PaymentDetails {
        upi_id: method.upi_id.clone(),
        account_number: method.account_number.clone(),
        routing_code: method.routing_code.clone(),
        wallet_provider: method.wallet_provider.clone(),
        is_primary: method.is_primary,
    }
}

/// Clears the primary flag on the owner's methods, except `keep`.
async fn clear_primary<C: ConnectionTrait>(
    conn: &C,
    owner_id: i32,
    keep: Option<i32>,
) -> LedgerResult<()> {
    let mut update = payment_methods::Entity::update_many()
        .col_expr(payment_methods::Column::IsPrimary, Expr::value(false))
        .filter(payment_methods::Column::UserId.eq(owner_id))
        .filter(payment_methods::Column::IsPrimary.eq(true));
    if let Some(id) = keep {
        update = update.filter(payment_methods::Column::Id.ne(id));
    }
    update.exec(conn).await.map_err(db_err)?;
    Ok(())
}
