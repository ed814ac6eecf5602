//! Fixed-point conversions between token amounts and USD value
//!
//! Feed answers carry 8 implied decimals and are rescaled to the engine's
//! 18-decimal precision before any multiplication. The two conversions are
//! approximate inverses; truncation toward zero on division is tolerated,
//! never an error.

use crate::constants::{FEED_RESCALE, PRECISION};
use crate::error::EngineResult;
use crate::math::{checked_mul, mul_div};
use crate::oracle::PriceOracle;

/// The oracle's latest answer rescaled to 18-decimal precision.
pub fn rescaled_price(oracle: &PriceOracle) -> EngineResult<u128> {
    let round = oracle.fresh_price()?;
    // fresh_price guarantees price > 0
    checked_mul(round.price as u128, FEED_RESCALE)
}

/// USD value (18 decimals) of `amount` of the oracle's token.
pub fn usd_value(oracle: &PriceOracle, amount: u128) -> EngineResult<u128> {
    let price = rescaled_price(oracle)?;
    mul_div(price, amount, PRECISION)
}

/// Token amount (18 decimals) worth `usd_amount` at the oracle's price.
pub fn token_amount_from_usd(oracle: &PriceOracle, usd_amount: u128) -> EngineResult<u128> {
    let price = rescaled_price(oracle)?;
    mul_div(usd_amount, PRECISION, price)
}
