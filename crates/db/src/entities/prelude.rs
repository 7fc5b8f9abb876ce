//! Entity re-exports.

pub use super::balances::Entity as Balances;
pub use super::group_members::Entity as GroupMembers;
pub use super::groups::Entity as Groups;
pub use super::payment_methods::Entity as PaymentMethods;
pub use super::requests::Entity as Requests;
pub use super::transaction_splits::Entity as TransactionSplits;
pub use super::transactions::Entity as Transactions;
pub use super::users::Entity as Users;
