//! Engine error taxonomy
//!
//! Every error aborts the entire top-level operation; there is no local
//! recovery or retry anywhere in the core. Partial application of a
//! financial state transition is never observable.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("token is not registered as collateral")]
    TokenNotAllowed,

    #[error("collateral token and price feed lists differ in length")]
    LengthMismatch,

    #[error("collateral token registered twice")]
    AlreadyRegistered,

    #[error("liability token reported a failed mint")]
    MintFailed,

    #[error("external token transfer reported failure")]
    TransferFailed,

    #[error("health factor {0} is below the minimum")]
    HealthFactorBelowMin(u128),

    #[error("health factor is above the minimum; account is not liquidatable")]
    HealthFactorOk,

    #[error("liquidation did not lift the health factor above the minimum")]
    HealthFactorNotImproved,

    #[error("price feed data is older than the staleness bound")]
    StalePrice,

    #[error("price feed returned a non-positive price")]
    InvalidPrice,

    #[error("reentrant call into a mutating engine operation")]
    ReentrantCall,

    #[error("arithmetic underflow")]
    ArithmeticUnderflow,

    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}

pub type EngineResult<T> = Result<T, EngineError>;
