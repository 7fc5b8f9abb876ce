//! Ledger facade.
//!
//! Bundles every repository over one connection pool and couples request
//! writes with counterparty notification. A notification is composed only
//! after the write commits, then delivered on a spawned task bounded by the
//! configured timeout. Delivery failures are logged and never reach the
//! caller. Deliveries still in flight when the last clone of the ledger is
//! dropped are abandoned; call [`Ledger::flush_notifications`] first to wait
//! for them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tally_core::{LedgerError, LedgerResult};
use tally_core::notification::Notification;
use tally_core::request::{NewRequest, RequestStatus};
use tally_core::validation::money;
use tally_shared::types::{RequestId, UserId};
use tally_shared::{NotificationConfig, Notifier};
use tracing::{debug, error, warn};

use crate::entities::{requests, users};
use crate::repositories::{
    BalanceRepository, GroupMemberRepository, GroupRepository, PaymentMethodRepository,
    ReferenceValidator, RequestRepository, TransactionRepository, TransactionSplitRepository,
    UserRepository,
};

/// Entry point to the ledger stores.
#[derive(Clone)]
pub struct Ledger {
    db: DatabaseConnection,
    users: UserRepository,
    groups: GroupRepository,
    members: GroupMemberRepository,
    payment_methods: PaymentMethodRepository,
    transactions: TransactionRepository,
    splits: TransactionSplitRepository,
    balances: BalanceRepository,
    requests: RequestRepository,
    references: ReferenceValidator,
    notifier: Arc<dyn Notifier>,
    notify_timeout: Duration,
    deliveries: Arc<Mutex<JoinSet<()>>>,
}

impl Ledger {
    /// Creates a ledger over `db` that notifies through `notifier`.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        notifier: Arc<dyn Notifier>,
        notifications: &NotificationConfig,
    ) -> Self {
        Self {
            users: UserRepository::new(db.clone()),
            groups: GroupRepository::new(db.clone()),
            members: GroupMemberRepository::new(db.clone()),
            payment_methods: PaymentMethodRepository::new(db.clone()),
            transactions: TransactionRepository::new(db.clone()),
            splits: TransactionSplitRepository::new(db.clone()),
            balances: BalanceRepository::new(db.clone()),
            requests: RequestRepository::new(db.clone()),
            references: ReferenceValidator::new(db.clone()),
            db,
            notifier,
            notify_timeout: notifications.timeout(),
            deliveries: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Identity store.
    #[must_use]
    pub const fn users(&self) -> &UserRepository {
        &self.users
    }

    /// Group store.
    #[must_use]
    pub const fn groups(&self) -> &GroupRepository {
        &self.groups
    }

    /// Group membership writer.
    #[must_use]
    pub const fn members(&self) -> &GroupMemberRepository {
        &self.members
    }

    /// Payment method store.
    #[must_use]
    pub const fn payment_methods(&self) -> &PaymentMethodRepository {
        &self.payment_methods
    }

    /// Transaction writer.
    #[must_use]
    pub const fn transactions(&self) -> &TransactionRepository {
        &self.transactions
    }

    /// Transaction split writer.
    #[must_use]
    pub const fn splits(&self) -> &TransactionSplitRepository {
        &self.splits
    }

    /// Balance writer.
    #[must_use]
    pub const fn balances(&self) -> &BalanceRepository {
        &self.balances
    }

    /// Request store without notification side effects.
    #[must_use]
    pub const fn requests(&self) -> &RequestRepository {
        &self.requests
    }

    /// Point-in-time existence checks.
    #[must_use]
    pub const fn references(&self) -> &ReferenceValidator {
        &self.references
    }

    /// Records a request and notifies the receiver.
    ///
    /// # Errors
    ///
    /// Returns the error of the request write. Notification problems are
    /// only logged.
    pub async fn add_request(&self, input: NewRequest) -> LedgerResult<requests::Model> {
        let request = self.requests.add_request(input).await?;

        match self.parties(&request).await {
            Ok((sender, receiver)) => {
                self.dispatch(Notification::request_received(
                    &receiver.email,
                    &sender.name,
                    money(request.amount),
                ))
                .await;
            }
            Err(e) => warn!(request_id = request.id, error = %e, "Request notification skipped"),
        }

        Ok(request)
    }

    /// Answers a request and notifies its sender.
    ///
    /// # Errors
    ///
    /// Returns the error of the status update. Notification problems are
    /// only logged.
    pub async fn update_request_status(
        &self,
        id: RequestId,
        status: RequestStatus,
    ) -> LedgerResult<requests::Model> {
        let request = self.requests.update_request_status(id, status).await?;

        match self.parties(&request).await {
            Ok((sender, receiver)) => {
                self.dispatch(Notification::request_updated(
                    &sender.email,
                    &receiver.name,
                    money(request.amount),
                    request.status.into(),
                ))
                .await;
            }
            Err(e) => warn!(request_id = request.id, error = %e, "Request notification skipped"),
        }

        Ok(request)
    }

    /// Loads the sender and receiver of a request.
    async fn parties(&self, request: &requests::Model) -> LedgerResult<(users::Model, users::Model)> {
        let sender_id = UserId::new(request.sender_id);
        let receiver_id = UserId::new(request.receiver_id);

        let sender = self
            .users
            .get_user_by_id(sender_id)
            .await?
            .ok_or(LedgerError::user_not_found(sender_id))?;
        let receiver = self
            .users
            .get_user_by_id(receiver_id)
            .await?
            .ok_or(LedgerError::user_not_found(receiver_id))?;

        Ok((sender, receiver))
    }

    /// Waits until every notification dispatched so far has been delivered,
    /// has failed, or has timed out.
    pub async fn flush_notifications(&self) {
        let mut deliveries = self.deliveries.lock().await;
        while let Some(joined) = deliveries.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Notification task aborted");
            }
        }
    }

    /// Delivers `notification` on a background task.
    async fn dispatch(&self, notification: Notification) {
        let notifier = Arc::clone(&self.notifier);
        let timeout = self.notify_timeout;

        let mut deliveries = self.deliveries.lock().await;
        while deliveries.try_join_next().is_some() {}
        deliveries.spawn(async move {
            let Notification { to, subject, body } = notification;
            match tokio::time::timeout(timeout, notifier.send(&to, &subject, &body)).await {
                Ok(Ok(())) => debug!(recipient = %to, subject = %subject, "Notification sent"),
                Ok(Err(e)) => error!(recipient = %to, error = %e, "Notification failed"),
                Err(_) => error!(
                    recipient = %to,
                    timeout_secs = timeout.as_secs(),
                    "Notification timed out"
                ),
            }
        });
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("notify_timeout", &self.notify_timeout)
            .finish_non_exhaustive()
    }
}
