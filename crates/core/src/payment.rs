//! Payment method field rules.
//!
//! A payment method carries exactly the fields its type requires:
//! - UPI: a UPI id
//! - Bank Account: an account number and a routing code
//!
//! A wallet provider and the primary flag are optional for both.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::validation::optional_text;

/// Kind of payment instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentType {
    /// Unified Payments Interface handle.
    #[serde(rename = "UPI")]
    Upi,
    /// Bank account with routing code.
    #[serde(rename = "Bank Account")]
    BankAccount,
}

impl PaymentType {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Upi => "UPI",
            Self::BankAccount => "Bank Account",
        }
    }

    /// Parses the stored representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "UPI" => Some(Self::Upi),
            "Bank Account" => Some(Self::BankAccount),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            LedgerError::InvalidArgument(format!(
                "unsupported payment type {s:?}, expected \"UPI\" or \"Bank Account\""
            ))
        })
    }
}

/// Type-specific fields of a payment method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    /// UPI handle.
    pub upi_id: Option<String>,
    /// Bank account number.
    pub account_number: Option<String>,
    /// Bank routing code (IFSC).
    pub routing_code: Option<String>,
    /// Wallet or bank app name.
    pub wallet_provider: Option<String>,
    /// Whether this is the owner's preferred method.
    pub is_primary: bool,
}

impl PaymentDetails {
    /// UPI details.
    #[must_use]
    pub fn upi(upi_id: impl Into<String>) -> Self {
        Self {
            upi_id: Some(upi_id.into()),
            ..Self::default()
        }
    }

    /// Bank account details.
    #[must_use]
    pub fn bank_account(account_number: impl Into<String>, routing_code: impl Into<String>) -> Self {
        Self {
            account_number: Some(account_number.into()),
            routing_code: Some(routing_code.into()),
            ..Self::default()
        }
    }

    /// Marks the method as primary.
    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    /// Trims text fields and blanks out empty ones.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            upi_id: optional_text(self.upi_id.as_deref()),
            account_number: optional_text(self.account_number.as_deref()),
            routing_code: optional_text(self.routing_code.as_deref()),
            wallet_provider: optional_text(self.wallet_provider.as_deref()),
            is_primary: self.is_primary,
        }
    }

    /// Checks that exactly the fields `payment_type` requires are present.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` naming the missing or unexpected field.
    pub fn validate_for(&self, payment_type: PaymentType) -> LedgerResult<()> {
        let missing = |field: &str| {
            LedgerError::InvalidArgument(format!("{field} is required for {payment_type}"))
        };
        let unexpected = |field: &str| {
            LedgerError::InvalidArgument(format!("{field} is not allowed for {payment_type}"))
        };

        match payment_type {
            PaymentType::Upi => {
                if self.upi_id.is_none() {
                    return Err(missing("upi_id"));
                }
                if self.account_number.is_some() {
                    return Err(unexpected("account_number"));
                }
                if self.routing_code.is_some() {
                    return Err(unexpected("routing_code"));
                }
            }
            PaymentType::BankAccount => {
                if self.account_number.is_none() {
                    return Err(missing("account_number"));
                }
                if self.routing_code.is_none() {
                    return Err(missing("routing_code"));
                }
                if self.upi_id.is_some() {
                    return Err(unexpected("upi_id"));
                }
            }
        }
        Ok(())
    }
}

/// Partial update of a payment method. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentDetailsPatch {
    /// New UPI handle.
    pub upi_id: Option<String>,
    /// New account number.
    pub account_number: Option<String>,
    /// New routing code.
    pub routing_code: Option<String>,
    /// New wallet provider.
    pub wallet_provider: Option<String>,
    /// New primary flag.
    pub is_primary: Option<bool>,
}

impl PaymentDetailsPatch {
    /// Returns true if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.upi_id.is_none()
            && self.account_number.is_none()
            && self.routing_code.is_none()
            && self.wallet_provider.is_none()
            && self.is_primary.is_none()
    }

    /// Merges the patch over `current`.
    ///
    /// Blank strings in the patch count as "not supplied".
    #[must_use]
    pub fn apply(&self, current: PaymentDetails) -> PaymentDetails {
        let pick = |patch: &Option<String>, stored: Option<String>| {
            optional_text(patch.as_deref()).or(stored)
        };
        PaymentDetails {
            upi_id: pick(&self.upi_id, current.upi_id),
            account_number: pick(&self.account_number, current.account_number),
            routing_code: pick(&self.routing_code, current.routing_code),
            wallet_provider: pick(&self.wallet_provider, current.wallet_provider),
            is_primary: self.is_primary.unwrap_or(current.is_primary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("UPI", PaymentType::Upi)]
    #[case("Bank Account", PaymentType::BankAccount)]
    #[case(" UPI ", PaymentType::Upi)]
    fn test_parse_payment_type(#[case] raw: &str, #[case] expected: PaymentType) {
        assert_eq!(raw.parse::<PaymentType>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_payment_type() {
        assert!(matches!(
            "Card".parse::<PaymentType>(),
            Err(LedgerError::InvalidArgument(_))
        ));
        assert!(PaymentType::parse("upi").is_none());
    }

    #[test]
    fn test_payment_type_display_uses_stored_names() {
        assert_eq!(PaymentType::Upi.to_string(), "UPI");
        assert_eq!(PaymentType::BankAccount.to_string(), "Bank Account");
    }

    #[test]
    fn test_upi_requires_upi_id() {
        assert!(PaymentDetails::upi("a@okbank").validate_for(PaymentType::Upi).is_ok());

        let err = PaymentDetails::default()
            .validate_for(PaymentType::Upi)
            .unwrap_err();
        assert!(err.to_string().contains("upi_id"));
    }

    #[test]
    fn test_bank_account_requires_both_fields() {
        assert!(
            PaymentDetails::bank_account("123456", "IFSC0001")
                .validate_for(PaymentType::BankAccount)
                .is_ok()
        );

        let only_number = PaymentDetails {
            account_number: Some("123456".into()),
            ..PaymentDetails::default()
        };
        let err = only_number
            .validate_for(PaymentType::BankAccount)
            .unwrap_err();
        assert!(err.to_string().contains("routing_code"));
    }

    #[test]
    fn test_foreign_fields_rejected() {
        let mut details = PaymentDetails::upi("a@okbank");
        details.account_number = Some("123".into());
        assert!(details.validate_for(PaymentType::Upi).is_err());

        let mut details = PaymentDetails::bank_account("123", "IFSC");
        details.upi_id = Some("a@okbank".into());
        assert!(details.validate_for(PaymentType::BankAccount).is_err());
    }

    #[test]
    fn test_normalized_blanks_empty_fields() {
        let details = PaymentDetails {
            upi_id: Some("  ".into()),
            wallet_provider: Some(" PayApp ".into()),
            ..PaymentDetails::default()
        }
        .normalized();
        assert_eq!(details.upi_id, None);
        assert_eq!(details.wallet_provider.as_deref(), Some("PayApp"));
        assert!(details.validate_for(PaymentType::Upi).is_err());
    }

    #[test]
    fn test_patch_only_changes_supplied_fields() {
        let current = PaymentDetails::bank_account("123", "IFSC0001").primary();
        let patch = PaymentDetailsPatch {
            routing_code: Some("IFSC0002".into()),
            ..PaymentDetailsPatch::default()
        };

        let merged = patch.apply(current);
        assert_eq!(merged.account_number.as_deref(), Some("123"));
        assert_eq!(merged.routing_code.as_deref(), Some("IFSC0002"));
        assert!(merged.is_primary);
    }

    #[test]
    fn test_patch_blank_string_keeps_value() {
        let current = PaymentDetails::upi("a@okbank");
        let patch = PaymentDetailsPatch {
            upi_id: Some(String::new()),
            is_primary: Some(true),
            ..PaymentDetailsPatch::default()
        };
        let merged = patch.apply(current);
        assert_eq!(merged.upi_id.as_deref(), Some("a@okbank"));
        assert!(merged.is_primary);
        assert!(PaymentDetailsPatch::default().is_empty());
        assert!(!patch.is_empty());
    }
}
