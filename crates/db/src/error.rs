//! Mapping of storage errors onto the ledger taxonomy.

use sea_orm::{DatabaseTransaction, DbErr, SqlErr};
use tally_core::{LedgerError, LedgerResult};

/// Converts a storage error into a ledger error.
///
/// Constraint violations mean the write lost a race against another writer
/// and become `Conflict`; anything else is `Transport`.
pub(crate) fn db_err(err: DbErr) -> LedgerError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            LedgerError::Conflict(format!("unique constraint violated: {detail}"))
        }
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
            LedgerError::Conflict(format!("foreign key constraint violated: {detail}"))
        }
        _ => LedgerError::Transport(err.to_string()),
    }
}

/// Commits an atomic unit.
///
/// A failed commit leaves the outcome unknown to the caller.
pub(crate) async fn commit(txn: DatabaseTransaction) -> LedgerResult<()> {
    txn.commit()
        .await
        .map_err(|e| LedgerError::CommitUncertain(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
    use tally_core::WriteOutcome;

    use crate::entities::{group_members, groups, users};
    use crate::migration::{Migrator, MigratorTrait};

    async fn migrated() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    fn member(group_id: i32, user_id: i32) -> group_members::ActiveModel {
        group_members::ActiveModel {
            group_id: Set(group_id),
            user_id: Set(user_id),
            joined_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
    }

    /// A membership insert that skipped the duplicate check still hits the
    /// unique index and surfaces as a conflict.
    #[tokio::test]
    async fn test_duplicate_membership_row_is_conflict() {
        let db = migrated().await;
        let user = users::ActiveModel {
            email: Set("a@x.com".to_string()),
            name: Set("A".to_string()),
            verified: Set(false),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        let group = groups::ActiveModel {
            name: Set("trip".to_string()),
            created_by: Set(user.id),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        member(group.id, user.id).insert(&db).await.unwrap();
        let err = db_err(member(group.id, user.id).insert(&db).await.unwrap_err());

        assert!(matches!(err, LedgerError::Conflict(ref msg) if msg.contains("unique")));
        assert_eq!(err.outcome(), WriteOutcome::RolledBack);
    }

    #[tokio::test]
    async fn test_dangling_reference_is_conflict() {
        let db = migrated().await;

        let err = db_err(member(404, 404).insert(&db).await.unwrap_err());

        assert!(matches!(err, LedgerError::Conflict(ref msg) if msg.contains("foreign key")));
    }

    #[test]
    fn test_generic_error_is_transport() {
        let err = db_err(DbErr::Custom("connection reset".to_string()));
        assert!(matches!(err, LedgerError::Transport(ref msg) if msg.contains("connection reset")));
        assert_eq!(err.outcome(), WriteOutcome::RolledBack);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_record_not_found_is_transport() {
        let err = db_err(DbErr::RecordNotFound("users".to_string()));
        assert_eq!(err.error_code(), "STORAGE_ERROR");
    }
}
