//! Decimal text form of amounts (`<whole>.<8 digits>`).

use std::fmt;

use crate::money::{is_money_range, Amount, COIN_DECIMALS, UNITS_PER_COIN};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseAmountError {
    Empty,
    Negative,
    Invalid,
    TooManyDecimals,
    OutOfRange,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::Empty => write!(f, "amount is empty"),
            ParseAmountError::Negative => write!(f, "amount must be >= 0"),
            ParseAmountError::Invalid => write!(f, "invalid amount"),
            ParseAmountError::TooManyDecimals => write!(
                f,
                "amount has more than {COIN_DECIMALS} decimal places"
            ),
            ParseAmountError::OutOfRange => write!(f, "amount out of range"),
        }
    }
}

impl std::error::Error for ParseAmountError {}

/// Formats any amount, including `Amount::MIN`, as a signed coin string.
pub fn format_amount(value: Amount) -> String {
    let value = i128::from(value);
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.abs();
    let unit = i128::from(UNITS_PER_COIN);
    let whole = abs / unit;
    let frac = abs % unit;
    format!("{sign}{whole}.{frac:0width$}", width = COIN_DECIMALS)
}

/// Parses a non-negative coin string into smallest units.
///
/// The result is always in money range.
pub fn parse_amount(text: &str) -> Result<Amount, ParseAmountError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseAmountError::Empty);
    }
    if text.starts_with('-') {
        return Err(ParseAmountError::Negative);
    }

    let (whole, frac) = match text.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (text, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(ParseAmountError::Invalid);
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(ParseAmountError::Invalid);
    }
    if frac.len() > COIN_DECIMALS {
        return Err(ParseAmountError::TooManyDecimals);
    }

    let whole_value = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<Amount>()
            .map_err(|_| ParseAmountError::OutOfRange)?
    };
    let mut frac_value: Amount = 0;
    for digit in frac.bytes() {
        frac_value = frac_value * 10 + Amount::from(digit - b'0');
    }
    for _ in frac.len()..COIN_DECIMALS {
        frac_value *= 10;
    }

    let value = whole_value
        .checked_mul(UNITS_PER_COIN)
        .and_then(|units| units.checked_add(frac_value))
        .ok_or(ParseAmountError::OutOfRange)?;
    if !is_money_range(value) {
        return Err(ParseAmountError::OutOfRange);
    }
    Ok(value)
}
