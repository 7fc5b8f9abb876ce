//! Identity store.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, sea_query::Expr,
};
use tally_core::validation::{email as valid_email, non_empty, optional_text};
use tally_core::{LedgerError, LedgerResult, Reference};
use tally_shared::types::UserId;
use tracing::info;

use crate::entities::users;
use crate::error::db_err;

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers a user.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a malformed email or empty name, and
    /// `Conflict` if the email is already registered.
    pub async fn add_user(
        &self,
        email: &str,
        name: &str,
        provider_uid: Option<&str>,
    ) -> LedgerResult<users::Model> {
        let email = valid_email(email)?;
        let name = non_empty("name", name)?;

        let user = users::ActiveModel {
            email: Set(email.to_string()),
            name: Set(name.to_string()),
            provider_uid: Set(optional_text(provider_uid)),
            verified: Set(false),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;

        info!(user_id = user.id, "User created");
        Ok(user)
    }

    /// Marks the user's email as verified.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` if no user has this email.
    pub async fn verify_email(&self, email: &str) -> LedgerResult<()> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::Verified, Expr::value(true))
            .filter(users::Column::Email.eq(email.trim()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(LedgerError::ReferenceNotFound(Reference::UserEmail(
                email.trim().to_string(),
            )));
        }
        info!(email = %email.trim(), "Email verified");
        Ok(())
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn get_user(&self, email: &str) -> LedgerResult<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email.trim()))
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn get_user_by_id(&self, id: UserId) -> LedgerResult<Option<users::Model>> {
        users::Entity::find_by_id(id.get())
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Resolves an email to a user id.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn get_user_id_by_email(&self, email: &str) -> LedgerResult<Option<UserId>> {
        Ok(self.get_user(email).await?.map(|u| UserId::new(u.id)))
    }

    /// Updates the name and/or provider identity of a user.
    ///
    /// Absent fields keep their stored value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if nothing would change or the name is blank,
    /// and `ReferenceNotFound` if no user has this email.
    pub async fn update_user_details(
        &self,
        email: &str,
        name: Option<&str>,
        provider_uid: Option<&str>,
    ) -> LedgerResult<users::Model> {
        if name.is_none() && provider_uid.is_none() {
            return Err(LedgerError::InvalidArgument(
                "nothing to update".to_string(),
            ));
        }
        let name = name.map(|n| non_empty("name", n)).transpose()?;

        let user = self.get_user(email).await?.ok_or_else(|| {
            LedgerError::ReferenceNotFound(Reference::UserEmail(email.trim().to_string()))
        })?;

        let mut active: users::ActiveModel = user.into();
        if let Some(name) = name {
            active.name = Set(name.to_string());
        }
        if let Some(uid) = provider_uid {
            active.provider_uid = Set(optional_text(Some(uid)));
        }
        let user = active.update(&self.db).await.map_err(db_err)?;

        info!(user_id = user.id, "User updated");
        Ok(user)
    }

    /// Deletes a user and everything that cascades from it.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` if no user has this email, and `Conflict`
    /// if the user still lends, borrows, splits or created a group.
    pub async fn delete_user(&self, email: &str) -> LedgerResult<()> {
        let result = users::Entity::delete_many()
            .filter(users::Column::Email.eq(email.trim()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(LedgerError::ReferenceNotFound(Reference::UserEmail(
                email.trim().to_string(),
            )));
        }
        info!(email = %email.trim(), "User deleted");
        Ok(())
    }

    /// Lists every user.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn get_all_users(&self) -> LedgerResult<Vec<users::Model>> {
        users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn email_exists(&self, email: &str) -> LedgerResult<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email.trim()))
            .count(&self.db)
            .await
            .map_err(db_err)?;

        Ok(count > 0)
    }
}
