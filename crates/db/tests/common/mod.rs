//! Shared fixtures for the integration tests.
//!
//! Every test gets its own migrated in-memory SQLite database.

#![allow(dead_code)]

use std::sync::Arc;

use sea_orm::{ConnectOptions, Database};
use tally_db::Ledger;
use tally_db::entities::{groups, users};
use tally_db::migration::{Migrator, MigratorTrait};
use tally_shared::types::{GroupId, UserId};
use tally_shared::{LogNotifier, NotificationConfig, Notifier};

/// Opens a fresh migrated database behind a ledger that only logs notifications.
pub async fn setup() -> Ledger {
    setup_with(Arc::new(LogNotifier)).await
}

/// Opens a fresh migrated database behind a ledger using `notifier`.
pub async fn setup_with(notifier: Arc<dyn Notifier>) -> Ledger {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None).await.expect("Failed to migrate");

    Ledger::new(db, notifier, &NotificationConfig::default())
}

/// Registers a user named after the local part of `email`.
pub async fn user(ledger: &Ledger, email: &str) -> users::Model {
    let name = email.split('@').next().unwrap_or(email).to_uppercase();
    ledger
        .users()
        .add_user(email, &name, None)
        .await
        .expect("Failed to create user")
}

/// Id of a freshly registered user.
pub async fn user_id(ledger: &Ledger, email: &str) -> UserId {
    UserId::new(user(ledger, email).await.id)
}

/// Creates a group owned by `creator`.
pub async fn group(ledger: &Ledger, name: &str, creator: UserId) -> groups::Model {
    ledger
        .groups()
        .add_group(name, creator)
        .await
        .expect("Failed to create group")
}

/// Id of a freshly created group.
pub async fn group_id(ledger: &Ledger, name: &str, creator: UserId) -> GroupId {
    GroupId::new(group(ledger, name, creator).await.id)
}
