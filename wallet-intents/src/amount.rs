//! Human-readable amount parsing.
//!
//! Payment requests carry amounts as strings that may use scientific notation
//! (`2.014e18`, `1.5e2`). [`normalize_amount`] turns them into a plain decimal
//! string and [`to_smallest_unit`] scales such a string by a token's decimal
//! precision into an integer amount.
//!
//! All arithmetic is exact ([`rust_decimal`]); nothing goes through floats.

use std::str::FromStr;

use alloy_primitives::U256;
use rust_decimal::Decimal;

/// Errors from amount parsing and scaling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// The string is not a decimal number.
    #[error("Not a decimal number: {0}")]
    Invalid(String),
    /// Negative amounts cannot be transferred.
    #[error("Amount must not be negative: {0}")]
    Negative(String),
    /// The amount has more fractional digits than the asset supports.
    #[error("Amount {amount} has more than {decimals} fractional digits")]
    TooPrecise {
        /// The offending amount.
        amount: String,
        /// The asset's decimal precision.
        decimals: u8,
    },
    /// The scaled amount does not fit in 256 bits.
    #[error("Amount overflows uint256")]
    Overflow,
}

/// Digits with at most one decimal point and an optional sign.
fn is_plain_number(raw: &str) -> bool {
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    digits.bytes().any(|b| b.is_ascii_digit())
        && digits.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && digits.bytes().filter(|&b| b == b'.').count() <= 1
}

/// Values outside the range of [`Decimal`] are an overflow, not a parse error.
fn parse_failure(raw: &str, error: &rust_decimal::Error) -> AmountError {
    let overflow = match error {
        rust_decimal::Error::ExceedsMaximumPossibleValue | rust_decimal::Error::LessThanMinimumPossibleValue => true,
        // positive exponent above the maximum scale
        rust_decimal::Error::ScaleExceedsMaximumPrecision(_) => !raw.contains("e-") && !raw.contains("E-"),
        _ => is_plain_number(raw),
    };
    if overflow {
        AmountError::Overflow
    } else {
        AmountError::Invalid(raw.to_owned())
    }
}

fn parse_decimal(raw: &str) -> Result<Decimal, AmountError> {
    let raw = raw.trim();
    let parsed = if raw.contains(['e', 'E']) {
        Decimal::from_scientific(raw)
    } else {
        Decimal::from_str(raw)
    };
    let value = parsed.map_err(|e| parse_failure(raw, &e))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AmountError::Negative(raw.to_owned()));
    }
    Ok(value.normalize())
}

/// Normalizes an amount string to a plain decimal string.
///
/// `"1.5e2"` becomes `"150"`, `"0.50"` becomes `"0.5"`.
///
/// # Errors
///
/// Returns [`AmountError::Invalid`] if the string is not a number,
/// [`AmountError::Negative`] for negative values and [`AmountError::Overflow`]
/// for values beyond the range of exact decimal arithmetic (about `7.9e28`).
pub fn normalize_amount(raw: &str) -> Result<String, AmountError> {
    parse_decimal(raw).map(|value| value.to_string())
}

/// Scales a decimal amount by `decimals` into the asset's smallest unit.
///
/// `to_smallest_unit("1.5", 6)` returns `1_500_000`.
///
/// # Errors
///
/// Returns [`AmountError::TooPrecise`] if the amount has more fractional
/// digits than `decimals`, and [`AmountError::Overflow`] if the result does
/// not fit in a `U256`.
pub fn to_smallest_unit(amount: &str, decimals: u8) -> Result<U256, AmountError> {
    let value = parse_decimal(amount)?;
    let scale = value.scale();
    if scale > u32::from(decimals) {
        return Err(AmountError::TooPrecise {
            amount: amount.to_owned(),
            decimals,
        });
    }
    let mantissa = u128::try_from(value.mantissa())
        .map_err(|_| AmountError::Negative(amount.to_owned()))?;
    let factor = U256::from(10u8)
        .checked_pow(U256::from(u32::from(decimals) - scale))
        .ok_or(AmountError::Overflow)?;
    U256::from(mantissa)
        .checked_mul(factor)
        .ok_or(AmountError::Overflow)
}
