//! Observable ledger events
//!
//! Emitted inside the mutating operations, before the corresponding
//! external transfer request. Events belonging to an operation that later
//! unwinds are retracted with it.

use crate::types::{Address, TokenId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    CollateralDeposited {
        account: Address,
        token: TokenId,
        amount: u128,
    },
    /// `from` and `to` differ during liquidation, where collateral is
    /// seized from the insolvent account and sent to the liquidator.
    CollateralRedeemed {
        from: Address,
        to: Address,
        token: TokenId,
        amount: u128,
    },
}
