//! Repository abstractions for data access.
//!
//! One repository per stored entity. Every multi-step write runs inside a
//! single database transaction and re-checks its references on it.

pub mod balance;
pub mod group;
pub mod group_member;
pub mod payment_method;
pub mod references;
pub mod request;
pub mod transaction;
pub mod transaction_split;
pub mod user;

pub use balance::BalanceRepository;
pub use group::GroupRepository;
pub use group_member::GroupMemberRepository;
pub use payment_method::PaymentMethodRepository;
pub use references::ReferenceValidator;
pub use request::RequestRepository;
pub use transaction::TransactionRepository;
pub use transaction_split::TransactionSplitRepository;
pub use user::UserRepository;
