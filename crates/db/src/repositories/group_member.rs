//! Group membership writer.
//!
//! Adds and removals run as one atomic unit each: the existence and
//! authorization checks read on the same transaction that writes.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tally_core::membership::{authorize_removal, validate_pair};
use tally_core::{LedgerError, LedgerResult, Reference};
use tally_shared::types::{GroupId, GroupMemberId, UserId};
use tracing::{info, warn};

use crate::entities::group_members;
use crate::error::{commit, db_err};
use crate::repositories::references::{lock_membership, require_group, require_user};

/// Group membership repository.
#[derive(Debug, Clone)]
pub struct GroupMemberRepository {
    db: DatabaseConnection,
}

impl GroupMemberRepository {
    /// Creates a new group membership repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Adds `user` to `group`.
    ///
    /// The group is checked before the user; if either check fails nothing
    /// is written.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for non-positive ids, `ReferenceNotFound`
    /// for a missing group or user, `AlreadyMember` if the pair exists, and
    /// `Conflict` if a concurrent add won the race.
    pub async fn add_group_member(
        &self,
        group: GroupId,
        user: UserId,
    ) -> LedgerResult<group_members::Model> {
        validate_pair(group, user)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        require_group(&txn, group).await?;
        require_user(&txn, user).await?;

        if lock_membership(&txn, group, user).await?.is_some() {
            return Err(LedgerError::AlreadyMember { group, user });
        }

        let member = group_members::ActiveModel {
            group_id: Set(group.get()),
            user_id: Set(user.get()),
            joined_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        commit(txn).await?;

        info!(group_id = %group, user_id = %user, member_id = member.id, "Member added");
        Ok(member)
    }

    /// Removes `user` from `group` on behalf of the group's creator.
    ///
    /// Checks run in order: membership, group existence, creator match.
    ///
    /// # Errors
    ///
    /// Returns `NotMember`, `ReferenceNotFound` or `NotAuthorized` for the
    /// respective failed check, and `NoOpDeletion` if the row vanished
    /// between the check and the delete.
    pub async fn remove_user_from_group_by_creator(
        &self,
        group: GroupId,
        user: UserId,
        creator: UserId,
    ) -> LedgerResult<()> {
        validate_pair(group, user)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let member = lock_membership(&txn, group, user)
            .await?
            .ok_or(LedgerError::NotMember { group, user })?;
        let stored = require_group(&txn, group).await?;

        if let Err(e) = authorize_removal(group, UserId::new(stored.created_by), creator) {
            warn!(group_id = %group, actor = %creator, "Member removal rejected");
            return Err(e);
        }

        let member_id = GroupMemberId::new(member.id);
        let result = member.delete(&txn).await.map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(LedgerError::NoOpDeletion(Reference::GroupMember(member_id)));
        }

        commit(txn).await?;

        info!(group_id = %group, user_id = %user, removed_by = %creator, "Member removed");
        Ok(())
    }

    /// Removes the acting user from `group`.
    ///
    /// # Errors
    ///
    /// Returns `NotMember` if the user is not in the group, and
    /// `NoOpDeletion` if the row vanished before the delete.
    pub async fn remove_user_self(&self, group: GroupId, user: UserId) -> LedgerResult<()> {
        validate_pair(group, user)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let member = lock_membership(&txn, group, user)
            .await?
            .ok_or(LedgerError::NotMember { group, user })?;

        let member_id = GroupMemberId::new(member.id);
        let result = member.delete(&txn).await.map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(LedgerError::NoOpDeletion(Reference::GroupMember(member_id)));
        }

        commit(txn).await?;

        info!(group_id = %group, user_id = %user, "Member left group");
        Ok(())
    }

    /// Finds a membership by ID.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn get_group_member_by_id(
        &self,
        id: GroupMemberId,
    ) -> LedgerResult<Option<group_members::Model>> {
        group_members::Entity::find_by_id(id.get())
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Lists the members of a group; empty if there are none.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn get_group_members_by_group_id(
        &self,
        group: GroupId,
    ) -> LedgerResult<Vec<group_members::Model>> {
        group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group.get()))
            .order_by_asc(group_members::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Checks whether `user` belongs to `group`.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn is_member(&self, group: GroupId, user: UserId) -> LedgerResult<bool> {
        let count = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group.get()))
            .filter(group_members::Column::UserId.eq(user.get()))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }
}
