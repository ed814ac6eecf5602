//! External token capabilities
//!
//! The engine never links against a concrete token. Collateral tokens and
//! the liability token are capabilities handed in at construction; `false`
//! return values signal a failed request and abort the calling operation.
//! `transfer` sends out of engine custody; `burn` destroys units already
//! pulled into custody.

use crate::types::Address;

/// Transfer surface of a collateral token.
pub trait CollateralSource {
    /// Move `amount` out of engine custody to `to`.
    fn transfer(&self, to: Address, amount: u128) -> bool;

    /// Move `amount` from `from` to `to` under the engine's authority.
    fn transfer_from(&self, from: Address, to: Address, amount: u128) -> bool;
}

/// The synthetic-dollar token. Its mint/burn authority is held exclusively
/// by the engine; no other entity may invoke those capabilities.
pub trait LiabilityToken {
    fn transfer(&self, to: Address, amount: u128) -> bool;

    fn transfer_from(&self, from: Address, to: Address, amount: u128) -> bool;

    /// Issue `amount` of new units to `account`.
    fn mint(&self, account: Address, amount: u128) -> bool;

    /// Destroy `amount` of units held in engine custody.
    fn burn(&self, amount: u128);
}
