//! Demo data seeder for the Tally ledger.
//!
//! Applies pending migrations, then records a small trip: users
//! `a@x.com` and `b@x.com`, a group "trip" created by A with B as member, and
//! a settled 100.00 transaction from A to B, and a 50.00 request from A to B.
//! The request's notification is flushed before exiting. Running it again is
//! a no-op.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use rust_decimal::Decimal;
use tally_core::ledger::{NewTransaction, TransactionStatus};
use tally_core::request::NewRequest;
use tally_db::Ledger;
use tally_db::migration::{Migrator, MigratorTrait};
use tally_shared::types::{GroupId, TransactionId, UserId};
use tally_shared::{AppConfig, EmailService, LogNotifier, Notifier};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const LENDER_EMAIL: &str = "a@x.com";
const BORROWER_EMAIL: &str = "b@x.com";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=debug,seeder=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let db = tally_db::connect_with(&config.database).await?;
    info!("Connected to database");
    Migrator::up(&db, None).await?;

    let notifier: Arc<dyn Notifier> = if config.notifications.enabled {
        info!(
            smtp_host = %config.email.smtp_host,
            smtp_port = %config.email.smtp_port,
            "Email notifications enabled"
        );
        Arc::new(EmailService::new(config.email.clone()))
    } else {
        Arc::new(LogNotifier)
    };
    let ledger = Ledger::new(db, notifier, &config.notifications);

    if ledger.users().email_exists(LENDER_EMAIL).await? {
        info!("Demo data already present, skipping");
        return Ok(());
    }

    seed_trip(&ledger).await?;
    ledger.flush_notifications().await;

    info!("Seeding complete");
    Ok(())
}

/// Records the demo trip.
async fn seed_trip(ledger: &Ledger) -> anyhow::Result<()> {
    let a = ledger.users().add_user(LENDER_EMAIL, "Alice", None).await?;
    let b = ledger.users().add_user(BORROWER_EMAIL, "Bob", None).await?;
    let (a, b) = (UserId::new(a.id), UserId::new(b.id));

    let trip = ledger.groups().add_group("trip", a).await?;
    let trip = GroupId::new(trip.id);
    ledger.members().add_group_member(trip, b).await?;

    let amount = Decimal::new(100, 0);
    let tx = ledger
        .transactions()
        .create_transaction(
            NewTransaction::new(a, b, amount)
                .in_group(trip)
                .with_purpose("Train tickets"),
        )
        .await?;
    let tx = TransactionId::new(tx.id);
    ledger.splits().create_even_splits(tx, &[a, b]).await?;
    ledger
        .transactions()
        .update_transaction_status(tx, TransactionStatus::Completed)
        .await?;

    ledger
        .add_request(NewRequest::new(a, b, Decimal::new(50, 0)).in_group(trip))
        .await?;

    for balance in ledger.balances().get_balances_by_group_id(trip).await? {
        info!(
            user_id = balance.user_id,
            owed = %balance.owed_amount,
            lent = %balance.lent_amount,
            "Trip balance"
        );
    }

    Ok(())
}
