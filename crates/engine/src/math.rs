//! Checked fixed-point arithmetic on u128 with 256-bit intermediates

use primitive_types::U256;

use crate::error::{EngineError, EngineResult};

pub fn checked_add(a: u128, b: u128) -> EngineResult<u128> {
    a.checked_add(b).ok_or(EngineError::ArithmeticOverflow)
}

/// Subtraction that never wraps; exceeding the balance is a typed failure.
pub fn checked_sub(a: u128, b: u128) -> EngineResult<u128> {
    a.checked_sub(b).ok_or(EngineError::ArithmeticUnderflow)
}

pub fn checked_mul(a: u128, b: u128) -> EngineResult<u128> {
    a.checked_mul(b).ok_or(EngineError::ArithmeticOverflow)
}

/// `a * b / denom`, widened through 256 bits so the product cannot wrap.
/// Truncates toward zero. `denom` is a rescaled price or [`crate::PRECISION`]
/// at every call site, never zero.
pub fn mul_div(a: u128, b: u128, denom: u128) -> EngineResult<u128> {
    if denom == 0 {
        return Err(EngineError::ArithmeticOverflow);
    }
    let wide = U256::from(a) * U256::from(b) / U256::from(denom);
    if wide > U256::from(u128::MAX) {
        return Err(EngineError::ArithmeticOverflow);
    }
    Ok(wide.as_u128())
}

/// [`mul_div`] that saturates at `u128::MAX` instead of failing. Used for
/// health factors, which are scores rather than money.
pub fn mul_div_saturating(a: u128, b: u128, denom: u128) -> u128 {
    if denom == 0 {
        return u128::MAX;
    }
    let wide = U256::from(a) * U256::from(b) / U256::from(denom);
    if wide > U256::from(u128::MAX) {
        u128::MAX
    } else {
        wide.as_u128()
    }
}
