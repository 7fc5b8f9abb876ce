//! Initial database migration.
//!
//! Creates the ledger tables, their foreign keys and indexes. Built with the
//! schema builder only, so the same migration runs on PostgreSQL and SQLite.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // PART 1: IDENTITY AND GROUPS
        // ============================================================
        manager.create_table(users_table()).await?;
        manager.create_table(groups_table()).await?;
        manager.create_table(group_members_table()).await?;
        manager
            .create_index(
                Index::create()
                    .name("uq_group_members_group_user")
                    .table(GroupMembers::Table)
                    .col(GroupMembers::GroupId)
                    .col(GroupMembers::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_group_members_user")
                    .table(GroupMembers::Table)
                    .col(GroupMembers::UserId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 2: PAYMENT METHODS
        // ============================================================
        manager.create_table(payment_methods_table()).await?;
        manager
            .create_index(
                Index::create()
                    .name("uq_payment_methods_user_type")
                    .table(PaymentMethods::Table)
                    .col(PaymentMethods::UserId)
                    .col(PaymentMethods::PaymentType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 3: LEDGER
        // ============================================================
        manager.create_table(transactions_table()).await?;
        for (name, column) in [
            ("idx_transactions_lender", Transactions::LenderId),
            ("idx_transactions_borrower", Transactions::BorrowerId),
            ("idx_transactions_group", Transactions::GroupId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Transactions::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        manager.create_table(transaction_splits_table()).await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_transaction_splits_transaction")
                    .table(TransactionSplits::Table)
                    .col(TransactionSplits::TransactionId)
                    .to_owned(),
            )
            .await?;

        manager.create_table(balances_table()).await?;
        manager
            .create_index(
                Index::create()
                    .name("uq_balances_user_group")
                    .table(Balances::Table)
                    .col(Balances::UserId)
                    .col(Balances::GroupId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 4: REQUESTS
        // ============================================================
        manager.create_table(requests_table()).await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_requests_receiver")
                    .table(Requests::Table)
                    .col(Requests::ReceiverId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Requests::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Balances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TransactionSplits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentMethods::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

fn id_column<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn money_column<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column).decimal_len(12, 2).not_null().to_owned()
}

fn timestamp_column<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

fn users_table() -> TableCreateStatement {
    Table::create()
        .table(Users::Table)
        .if_not_exists()
        .col(id_column(Users::Id))
        .col(
            ColumnDef::new(Users::Email)
                .string_len(255)
                .not_null()
                .unique_key(),
        )
        .col(ColumnDef::new(Users::Name).string_len(255).not_null())
        .col(ColumnDef::new(Users::ProviderUid).string_len(255))
        .col(
            ColumnDef::new(Users::Verified)
                .boolean()
                .not_null()
                .default(false),
        )
        .col(timestamp_column(Users::CreatedAt))
        .to_owned()
}

fn groups_table() -> TableCreateStatement {
    Table::create()
        .table(Groups::Table)
        .if_not_exists()
        .col(id_column(Groups::Id))
        .col(ColumnDef::new(Groups::Name).string_len(255).not_null())
        .col(ColumnDef::new(Groups::CreatedBy).integer().not_null())
        .col(timestamp_column(Groups::CreatedAt))
        .foreign_key(
            ForeignKey::create()
                .name("fk_groups_created_by")
                .from(Groups::Table, Groups::CreatedBy)
                .to(Users::Table, Users::Id),
        )
        .to_owned()
}

fn group_members_table() -> TableCreateStatement {
    Table::create()
        .table(GroupMembers::Table)
        .if_not_exists()
        .col(id_column(GroupMembers::Id))
        .col(ColumnDef::new(GroupMembers::GroupId).integer().not_null())
        .col(ColumnDef::new(GroupMembers::UserId).integer().not_null())
        .col(timestamp_column(GroupMembers::JoinedAt))
        .foreign_key(
            ForeignKey::create()
                .name("fk_group_members_group")
                .from(GroupMembers::Table, GroupMembers::GroupId)
                .to(Groups::Table, Groups::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_group_members_user")
                .from(GroupMembers::Table, GroupMembers::UserId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

fn payment_methods_table() -> TableCreateStatement {
    Table::create()
        .table(PaymentMethods::Table)
        .if_not_exists()
        .col(id_column(PaymentMethods::Id))
        .col(ColumnDef::new(PaymentMethods::UserId).integer().not_null())
        .col(
            ColumnDef::new(PaymentMethods::PaymentType)
                .string_len(20)
                .not_null(),
        )
        .col(ColumnDef::new(PaymentMethods::UpiId).string_len(255))
        .col(ColumnDef::new(PaymentMethods::AccountNumber).string_len(64))
        .col(ColumnDef::new(PaymentMethods::RoutingCode).string_len(32))
        .col(ColumnDef::new(PaymentMethods::WalletProvider).string_len(255))
        .col(
            ColumnDef::new(PaymentMethods::IsPrimary)
                .boolean()
                .not_null()
                .default(false),
        )
        .col(timestamp_column(PaymentMethods::CreatedAt))
        .foreign_key(
            ForeignKey::create()
                .name("fk_payment_methods_user")
                .from(PaymentMethods::Table, PaymentMethods::UserId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

fn transactions_table() -> TableCreateStatement {
    Table::create()
        .table(Transactions::Table)
        .if_not_exists()
        .col(id_column(Transactions::Id))
        .col(ColumnDef::new(Transactions::LenderId).integer().not_null())
        .col(ColumnDef::new(Transactions::BorrowerId).integer().not_null())
        .col(ColumnDef::new(Transactions::GroupId).integer())
        .col(money_column(Transactions::Amount))
        .col(
            ColumnDef::new(Transactions::Status)
                .string_len(20)
                .not_null()
                .default("pending"),
        )
        .col(ColumnDef::new(Transactions::Purpose).text())
        .col(ColumnDef::new(Transactions::PaymentMethodId).integer())
        .col(
            ColumnDef::new(Transactions::RetryCount)
                .integer()
                .not_null()
                .default(0),
        )
        .col(ColumnDef::new(Transactions::FailureReason).text())
        .col(timestamp_column(Transactions::CreatedAt))
        .col(timestamp_column(Transactions::UpdatedAt))
        .foreign_key(
            ForeignKey::create()
                .name("fk_transactions_lender")
                .from(Transactions::Table, Transactions::LenderId)
                .to(Users::Table, Users::Id),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_transactions_borrower")
                .from(Transactions::Table, Transactions::BorrowerId)
                .to(Users::Table, Users::Id),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_transactions_group")
                .from(Transactions::Table, Transactions::GroupId)
                .to(Groups::Table, Groups::Id),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_transactions_payment_method")
                .from(Transactions::Table, Transactions::PaymentMethodId)
                .to(PaymentMethods::Table, PaymentMethods::Id)
                .on_delete(ForeignKeyAction::SetNull),
        )
        .to_owned()
}

fn transaction_splits_table() -> TableCreateStatement {
    Table::create()
        .table(TransactionSplits::Table)
        .if_not_exists()
        .col(id_column(TransactionSplits::Id))
        .col(
            ColumnDef::new(TransactionSplits::TransactionId)
                .integer()
                .not_null(),
        )
        .col(ColumnDef::new(TransactionSplits::UserId).integer().not_null())
        .col(money_column(TransactionSplits::Amount))
        .col(timestamp_column(TransactionSplits::CreatedAt))
        .foreign_key(
            ForeignKey::create()
                .name("fk_transaction_splits_transaction")
                .from(TransactionSplits::Table, TransactionSplits::TransactionId)
                .to(Transactions::Table, Transactions::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_transaction_splits_user")
                .from(TransactionSplits::Table, TransactionSplits::UserId)
                .to(Users::Table, Users::Id),
        )
        .to_owned()
}

fn balances_table() -> TableCreateStatement {
    Table::create()
        .table(Balances::Table)
        .if_not_exists()
        .col(id_column(Balances::Id))
        .col(ColumnDef::new(Balances::UserId).integer().not_null())
        .col(ColumnDef::new(Balances::GroupId).integer())
        .col(money_column(Balances::OwedAmount).default(0))
        .col(money_column(Balances::LentAmount).default(0))
        .col(timestamp_column(Balances::UpdatedAt))
        .foreign_key(
            ForeignKey::create()
                .name("fk_balances_user")
                .from(Balances::Table, Balances::UserId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_balances_group")
                .from(Balances::Table, Balances::GroupId)
                .to(Groups::Table, Groups::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

fn requests_table() -> TableCreateStatement {
    Table::create()
        .table(Requests::Table)
        .if_not_exists()
        .col(id_column(Requests::Id))
        .col(ColumnDef::new(Requests::SenderId).integer().not_null())
        .col(ColumnDef::new(Requests::ReceiverId).integer().not_null())
        .col(ColumnDef::new(Requests::GroupId).integer())
        .col(money_column(Requests::Amount))
        .col(
            ColumnDef::new(Requests::Status)
                .string_len(20)
                .not_null()
                .default("pending"),
        )
        .col(timestamp_column(Requests::CreatedAt))
        .col(timestamp_column(Requests::UpdatedAt))
        .foreign_key(
            ForeignKey::create()
                .name("fk_requests_sender")
                .from(Requests::Table, Requests::SenderId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_requests_receiver")
                .from(Requests::Table, Requests::ReceiverId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_requests_group")
                .from(Requests::Table, Requests::GroupId)
                .to(Groups::Table, Groups::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Email,
    Name,
    ProviderUid,
    Verified,
    CreatedAt,
}

#[derive(Iden)]
enum Groups {
    Table,
    Id,
    Name,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum GroupMembers {
    Table,
    Id,
    GroupId,
    UserId,
    JoinedAt,
}

#[derive(Iden)]
enum PaymentMethods {
    Table,
    Id,
    UserId,
    PaymentType,
    UpiId,
    AccountNumber,
    RoutingCode,
    WalletProvider,
    IsPrimary,
    CreatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    LenderId,
    BorrowerId,
    GroupId,
    Amount,
    Status,
    Purpose,
    PaymentMethodId,
    RetryCount,
    FailureReason,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum TransactionSplits {
    Table,
    Id,
    TransactionId,
    UserId,
    Amount,
    CreatedAt,
}

#[derive(Iden)]
enum Balances {
    Table,
    Id,
    UserId,
    GroupId,
    OwedAmount,
    LentAmount,
    UpdatedAt,
}

#[derive(Iden)]
enum Requests {
    Table,
    Id,
    SenderId,
    ReceiverId,
    GroupId,
    Amount,
    Status,
    CreatedAt,
    UpdatedAt,
}
