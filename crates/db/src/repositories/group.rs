//! Group store.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use tally_core::validation::{non_empty, positive_id};
use tally_core::{LedgerError, LedgerResult};
use tally_shared::types::{GroupId, UserId};
use tracing::info;

use crate::entities::{group_members, groups};
use crate::error::{commit, db_err};
use crate::repositories::references::{require_group, require_user};

/// Group repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct GroupRepository {
    db: DatabaseConnection,
}

impl GroupRepository {
    /// Creates a new group repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a group owned by `creator`.
    ///
    /// The creator is not added as a member.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty name or bad id, and
    /// `ReferenceNotFound` if the creator does not exist.
    pub async fn add_group(&self, name: &str, creator: UserId) -> LedgerResult<groups::Model> {
        let name = non_empty("name", name)?;
        positive_id("created_by", creator.get())?;

        let txn = self.db.begin().await.map_err(db_err)?;
        require_user(&txn, creator).await?;

        let group = groups::ActiveModel {
            name: Set(name.to_string()),
            created_by: Set(creator.get()),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        commit(txn).await?;

        info!(group_id = group.id, created_by = %creator, "Group created");
        Ok(group)
    }

    /// Finds a group by ID.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn get_group(&self, id: GroupId) -> LedgerResult<Option<groups::Model>> {
        groups::Entity::find_by_id(id.get())
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Lists every group.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn get_all_groups(&self) -> LedgerResult<Vec<groups::Model>> {
        groups::Entity::find()
            .order_by_asc(groups::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Renames a group.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty name and `ReferenceNotFound`
    /// if the group does not exist.
    pub async fn update_group(&self, id: GroupId, name: &str) -> LedgerResult<groups::Model> {
        let name = non_empty("name", name)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let group = require_group(&txn, id).await?;

        let mut active: groups::ActiveModel = group.into();
        active.name = Set(name.to_string());
        let group = active.update(&txn).await.map_err(db_err)?;

        commit(txn).await?;

        info!(group_id = group.id, "Group renamed");
        Ok(group)
    }

    /// Deletes a group and its memberships.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` if the group does not exist, and `Conflict`
    /// if transactions still belong to it.
    pub async fn delete_group(&self, id: GroupId) -> LedgerResult<()> {
        let result = groups::Entity::delete_by_id(id.get())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(LedgerError::group_not_found(id));
        }
        info!(group_id = %id, "Group deleted");
        Ok(())
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

    /// Returns the creator of a group.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` if the group does not exist.
    pub async fn group_creator(&self, id: GroupId) -> LedgerResult<UserId> {
        self.get_group(id)
            .await?
            .map(|g| UserId::new(g.created_by))
            .ok_or(LedgerError::group_not_found(id))
    }

    /// Lists the groups a user belongs to.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` if the user does not exist.
    pub async fn list_groups_for_user(&self, user: UserId) -> LedgerResult<Vec<groups::Model>> {
        require_user(&self.db, user).await?;

        groups::Entity::find()
            .join(JoinType::InnerJoin, groups::Relation::GroupMembers.def())
            .filter(group_members::Column::UserId.eq(user.get()))
            .order_by_asc(groups::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)
    }
}
