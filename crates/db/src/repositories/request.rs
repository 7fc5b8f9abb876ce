//! Payment request store.
//!
//! Pure persistence. Notifying the counterparty is done by
//! [`crate::ledger::Ledger`] after the write commits.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tally_core::request::{NewRequest, RequestStatus as CoreStatus};
use tally_core::{LedgerError, LedgerResult, Reference};
use tally_shared::types::{GroupId, RequestId, UserId};
use tracing::info;

use crate::entities::{requests, sea_orm_active_enums::RequestStatus};
use crate::error::{commit, db_err};
use crate::repositories::references::{require_group, require_user};

/// Request repository.
#[derive(Debug, Clone)]
pub struct RequestRepository {
    db: DatabaseConnection,
}

impl RequestRepository {
    /// Creates a new request repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a pending request from sender to receiver.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-positive amount or id, and
    /// `ReferenceNotFound` for a missing sender, receiver or group.
    pub async fn add_request(&self, input: NewRequest) -> LedgerResult<requests::Model> {
        input.validate()?;

        let txn = self.db.begin().await.map_err(db_err)?;
        require_user(&txn, input.sender_id).await?;
        require_user(&txn, input.receiver_id).await?;
        if let Some(group) = input.group_id {
            require_group(&txn, group).await?;
        }

        let now = chrono::Utc::now();
        let request = requests::ActiveModel {
            sender_id: Set(input.sender_id.get()),
            receiver_id: Set(input.receiver_id.get()),
            group_id: Set(input.group_id.map(GroupId::get)),
            amount: Set(input.amount),
            status: Set(RequestStatus::Pending),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        commit(txn).await?;

        info!(
            request_id = request.id,
            sender_id = request.sender_id,
            receiver_id = request.receiver_id,
            "Request created"
        );
        Ok(request)
    }

    /// Answers a pending request.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` if the request does not exist and
    /// `InvalidTransition` unless it is pending and `status` is terminal.
    pub async fn update_request_status(
        &self,
        id: RequestId,
        status: CoreStatus,
    ) -> LedgerResult<requests::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let current = requests::Entity::find_by_id(id.get())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::ReferenceNotFound(Reference::Request(id)))?;

        let next = CoreStatus::from(current.status).transition(status)?;

        let mut active: requests::ActiveModel = current.into();
        active.status = Set(next.into());
        active.updated_at = Set(chrono::Utc::now().into());
        let request = active.update(&txn).await.map_err(db_err)?;

        commit(txn).await?;

        info!(request_id = %id, status = %next, "Request status updated");
        Ok(request)
    }

    /// Deletes a request.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` if the request does not exist.
    pub async fn delete_request(&self, id: RequestId) -> LedgerResult<()> {
        let result = requests::Entity::delete_by_id(id.get())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(LedgerError::ReferenceNotFound(Reference::Request(id)));
        }
        info!(request_id = %id, "Request deleted");
        Ok(())
    }

    /// Finds a request by ID.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the query fails.
    pub async fn get_request_by_id(&self, id: RequestId) -> LedgerResult<Option<requests::Model>> {
        requests::Entity::find_by_id(id.get())
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Lists the requests a user received.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` if the user does not exist.
    pub async fn get_requests_by_receiver(
        &self,
        receiver: UserId,
    ) -> LedgerResult<Vec<requests::Model>> {
        require_user(&self.db, receiver).await?;
        self.list(requests::Column::ReceiverId, receiver.get()).await
    }

    /// Lists the requests a user sent.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` if the user does not exist.
    pub async fn get_requests_by_sender(
        &self,
        sender: UserId,
    ) -> LedgerResult<Vec<requests::Model>> {
        require_user(&self.db, sender).await?;
        self.list(requests::Column::SenderId, sender.get()).await
    }

    /// Lists the requests made within a group.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceNotFound` if the group does not exist.
    pub async fn get_requests_by_group(
        &self,
        group: GroupId,
    ) -> LedgerResult<Vec<requests::Model>> {
        require_group(&self.db, group).await?;
        self.list(requests::Column::GroupId, group.get()).await
    }

    async fn list(&self, column: requests::Column, id: i32) -> LedgerResult<Vec<requests::Model>> {
        requests::Entity::find()
            .filter(column.eq(id))
            .order_by_asc(requests::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)
    }
}
