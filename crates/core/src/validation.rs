//! Input checks that run before any store access.
//!
//! Every failure here is an [`LedgerError::InvalidArgument`], so nothing is
//! ever written when one of these rejects.

use rust_decimal::Decimal;

use crate::error::{LedgerError, LedgerResult};

/// Scale of every stored money column.
pub const MONEY_SCALE: u32 = 2;

/// Largest absolute amount a `DECIMAL(12,2)` column holds.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Rejects a non-positive entity key.
///
/// # Errors
///
/// Returns `InvalidArgument` if `raw` is zero or negative.
pub fn positive_id(field: &str, raw: i32) -> LedgerResult<()> {
    if raw <= 0 {
        return Err(LedgerError::InvalidArgument(format!(
            "{field} must be a positive id, got {raw}"
        )));
    }
    Ok(())
}

/// Rejects an amount that is not strictly positive or does not fit a money column.
///
/// # Errors
///
/// Returns `InvalidArgument` on zero, negative, over-precise or oversized amounts.
pub fn positive_amount(field: &str, amount: Decimal) -> LedgerResult<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidArgument(format!(
            "{field} must be greater than zero"
        )));
    }
    money_shape(field, amount)
}

/// Rejects a negative amount or one that does not fit a money column.
///
/// # Errors
///
/// Returns `InvalidArgument` on negative, over-precise or oversized amounts.
pub fn non_negative_amount(field: &str, amount: Decimal) -> LedgerResult<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(LedgerError::InvalidArgument(format!(
            "{field} cannot be negative"
        )));
    }
    money_shape(field, amount)
}

/// Rounds a stored amount back to money scale.
///
/// Backends without a native decimal type hand amounts back with binary
/// float noise.
#[must_use]
pub fn money(amount: Decimal) -> Decimal {
    amount.round_dp(MONEY_SCALE)
}

fn money_shape(field: &str, amount: Decimal) -> LedgerResult<()> {
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(LedgerError::InvalidArgument(format!(
            "{field} cannot have more than {MONEY_SCALE} decimal places"
        )));
    }
    if amount.abs() > MAX_AMOUNT {
        return Err(LedgerError::InvalidArgument(format!(
            "{field} exceeds the maximum of {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

/// Trims `value` and rejects it if nothing is left.
///
/// # Errors
///
/// Returns `InvalidArgument` for empty or whitespace-only input.
pub fn non_empty<'a>(field: &str, value: &'a str) -> LedgerResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidArgument(format!(
            "{field} cannot be empty"
        )));
    }
    Ok(trimmed)
}

/// Trims an optional text field, mapping blank input to `None`.
#[must_use]
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Checks the basic shape of an email address and returns it trimmed.
///
/// # Errors
///
/// Returns `InvalidArgument` if the address has no local part, no `@`,
/// or a domain without a dot.
pub fn email(value: &str) -> LedgerResult<&str> {
    let trimmed = non_empty("email", value)?;
    let invalid = || LedgerError::InvalidArgument(format!("invalid email address: {trimmed}"));

    let (local, domain) = trimmed.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || trimmed.chars().any(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(trimmed)
}
