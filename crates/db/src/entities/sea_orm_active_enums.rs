//! String-backed enums stored in status and type columns.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use tally_core::ledger::TransactionStatus as CoreTransactionStatus;
use tally_core::payment::PaymentType as CorePaymentType;
use tally_core::request::RequestStatus as CoreRequestStatus;

/// Stored transaction status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum TransactionStatus {
    /// Not yet settled.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Settled.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Settlement failed.
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Stored request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum RequestStatus {
    /// Awaiting an answer.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Accepted by the receiver.
    #[sea_orm(string_value = "accepted")]
    Accepted,
    /// Declined by the receiver.
    #[sea_orm(string_value = "declined")]
    Declined,
}

/// Stored payment method type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PaymentType {
    /// UPI handle.
    #[sea_orm(string_value = "UPI")]
    Upi,
    /// Bank account.
    #[sea_orm(string_value = "Bank Account")]
    BankAccount,
}

impl From<CoreTransactionStatus> for TransactionStatus {
    fn from(status: CoreTransactionStatus) -> Self {
        match status {
            CoreTransactionStatus::Pending => Self::Pending,
            CoreTransactionStatus::Completed => Self::Completed,
            CoreTransactionStatus::Failed => Self::Failed,
        }
    }
}

impl From<TransactionStatus> for CoreTransactionStatus {
    fn from(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Pending => Self::Pending,
            TransactionStatus::Completed => Self::Completed,
            TransactionStatus::Failed => Self::Failed,
        }
    }
}

impl From<CoreRequestStatus> for RequestStatus {
    fn from(status: CoreRequestStatus) -> Self {
        match status {
            CoreRequestStatus::Pending => Self::Pending,
            CoreRequestStatus::Accepted => Self::Accepted,
            CoreRequestStatus::Declined => Self::Declined,
        }
    }
}

impl From<RequestStatus> for CoreRequestStatus {
    fn from(status: RequestStatus) -> Self {
        match status {
            RequestStatus::Pending => Self::Pending,
            RequestStatus::Accepted => Self::Accepted,
            RequestStatus::Declined => Self::Declined,
        }
    }
}

impl From<CorePaymentType> for PaymentType {
    fn from(payment_type: CorePaymentType) -> Self {
        match payment_type {
            CorePaymentType::Upi => Self::Upi,
            CorePaymentType::BankAccount => Self::BankAccount,
        }
    }
}

impl From<PaymentType> for CorePaymentType {
    fn from(payment_type: PaymentType) -> Self {
        match payment_type {
            PaymentType::Upi => Self::Upi,
            PaymentType::BankAccount => Self::BankAccount,
        }
    }
}
