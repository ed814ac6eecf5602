//! Solvency scoring
//!
//! A single pure function turns (debt, collateral value) into a health
//! factor. It reads no state and is independently callable for simulation
//! without touching any ledger.

use crate::constants::{LIQUIDATION_PRECISION, LIQUIDATION_THRESHOLD, PRECISION};
use crate::math::mul_div_saturating;

/// Health factor of a position in 18-decimal fixed point.
///
/// A debt-free account is maximally healthy; otherwise the score is the
/// ratio of threshold-adjusted collateral value to debt. Values below
/// [`crate::MIN_HEALTH_FACTOR`] mark insolvency.
pub fn calculate_health_factor(debt: u128, collateral_value: u128) -> u128 {
    if debt == 0 {
        return u128::MAX;
    }
    let adjusted = mul_div_saturating(collateral_value, LIQUIDATION_THRESHOLD, LIQUIDATION_PRECISION);
    mul_div_saturating(adjusted, PRECISION, debt)
}
