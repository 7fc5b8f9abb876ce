//! `SeaORM` entities for the ledger schema.

pub mod prelude;

pub mod balances;
pub mod group_members;
pub mod groups;
pub mod payment_methods;
pub mod requests;
pub mod sea_orm_active_enums;
pub mod transaction_splits;
pub mod transactions;
pub mod users;
