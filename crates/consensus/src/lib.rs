//! Consensus monetary amount rules.

pub mod amount;
pub mod money;

pub use amount::{format_amount, parse_amount, ParseAmountError};
pub use money::{
    amount_from_u64, checked_money_add, is_money_range, is_signed_money_range, sum_money, Amount,
    MoneyError, CENT, COIN, COIN_DECIMALS, MAX_MONEY, SUPPLY_CEILING, UNITS_PER_COIN,
};
