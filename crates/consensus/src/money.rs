//! Monetary units and money range rules.
//!
//! Every value here is consensus critical: changing the width of [`Amount`],
//! the value of [`SUPPLY_CEILING`], or the bounds checked by
//! [`is_money_range`] splits the network.

use std::fmt;

/// Amount in smallest units. Can be negative when used as a delta.
pub type Amount = i64;

/// Smallest units in one coin.
pub const UNITS_PER_COIN: Amount = 100_000_000;
/// Fractional digits in the display form of a coin amount.
pub const COIN_DECIMALS: usize = 8;

/// No amount larger than this (in smallest units) is valid.
///
/// This is *not* the circulating supply, which is lower and follows from the
/// issuance schedule. It is a sanity bound used by validation, so its exact
/// value is consensus critical and must not be adjusted to track supply.
pub const SUPPLY_CEILING: Amount = 105_000_000 * UNITS_PER_COIN;

pub const COIN: Amount = UNITS_PER_COIN;
pub const CENT: Amount = 1_000_000;
pub const MAX_MONEY: Amount = SUPPLY_CEILING;

/// Returns true when `value` lies in the closed interval `[0, SUPPLY_CEILING]`.
#[inline]
pub const fn is_money_range(value: Amount) -> bool {
    value >= 0 && value <= SUPPLY_CEILING
}

/// Like [`is_money_range`] but also admits the negated range, for value
/// balances and pool deltas.
#[inline]
pub const fn is_signed_money_range(value: Amount) -> bool {
    value >= -SUPPLY_CEILING && value <= SUPPLY_CEILING
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MoneyError {
    OutOfRange,
    Overflow,
}

impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyError::OutOfRange => write!(f, "value out of range"),
            MoneyError::Overflow => write!(f, "value overflow"),
        }
    }
}

impl std::error::Error for MoneyError {}

/// Adds `value` to a running `total`, requiring both operands and the result
/// to be in money range.
pub fn checked_money_add(total: Amount, value: Amount) -> Result<Amount, MoneyError> {
    if !is_money_range(total) || !is_money_range(value) {
        return Err(MoneyError::OutOfRange);
    }
    let sum = total.checked_add(value).ok_or(MoneyError::Overflow)?;
    if !is_money_range(sum) {
        return Err(MoneyError::OutOfRange);
    }
    Ok(sum)
}

/// Sums amounts the way output values are totalled during validation:
/// every element and every partial sum must stay in money range.
pub fn sum_money<I>(values: I) -> Result<Amount, MoneyError>
where
    I: IntoIterator<Item = Amount>,
{
    values
        .into_iter()
        .try_fold(0, |total, value| checked_money_add(total, value))
}

/// Converts an unsigned wire value into an [`Amount`] in money range.
pub fn amount_from_u64(value: u64) -> Result<Amount, MoneyError> {
    let amount = Amount::try_from(value).map_err(|_| MoneyError::Overflow)?;
    if !is_money_range(amount) {
        return Err(MoneyError::OutOfRange);
    }
    Ok(amount)
}
