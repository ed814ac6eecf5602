//! Fixed-point and liquidation policy constants

/// Engine fixed-point scale: all monetary quantities carry 18 decimals.
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// Price feeds answer with 8 implied decimals.
pub const FEED_PRECISION: u128 = 100_000_000;

/// Bridges 8-decimal feed answers up to the 18-decimal engine scale.
pub const FEED_RESCALE: u128 = 10_000_000_000;

/// Share of collateral value that counts toward solvency (50%): an account
/// is healthy only while debt does not exceed half its collateral value.
pub const LIQUIDATION_THRESHOLD: u128 = 50;

/// Denominator for [`LIQUIDATION_THRESHOLD`] and [`LIQUIDATION_BONUS`].
pub const LIQUIDATION_PRECISION: u128 = 100;

/// Collateral paid to the liquidator on top of the seized amount (10%).
pub const LIQUIDATION_BONUS: u128 = 10;

/// Health factors below this mark an account insolvent (1.0 fixed point).
pub const MIN_HEALTH_FACTOR: u128 = PRECISION;

/// Oracle rounds older than this are unusable (2 hours).
pub const MAX_PRICE_AGE_SECS: u64 = 2 * 60 * 60;
