//! Per-account ledger state
//!
//! The engine exclusively owns this state. Entries are created implicitly
//! on first deposit or mint and never deleted; zero balances persist as a
//! degenerate state. Every mutation is checked and never wraps.

use std::collections::HashMap;

use crate::error::EngineResult;
use crate::math::{checked_add, checked_sub};
use crate::types::{Address, TokenId};

/// One account's position: deposited collateral per token plus minted debt.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Position {
    pub collateral: HashMap<TokenId, u128>,
    pub debt: u128,
}

impl Position {
    pub fn collateral_balance(&self, token: TokenId) -> u128 {
        self.collateral.get(&token).copied().unwrap_or(0)
    }
}

/// All account positions, keyed by identity.
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: HashMap<Address, Position>,
}

impl Ledger {
    pub fn position(&self, account: Address) -> Option<&Position> {
        self.accounts.get(&account)
    }

    pub fn collateral_balance(&self, account: Address, token: TokenId) -> u128 {
        self.accounts
            .get(&account)
            .map(|p| p.collateral_balance(token))
            .unwrap_or(0)
    }

    pub fn debt(&self, account: Address) -> u128 {
        self.accounts.get(&account).map(|p| p.debt).unwrap_or(0)
    }

    pub fn credit_collateral(
        &mut self,
        account: Address,
        token: TokenId,
        amount: u128,
    ) -> EngineResult<()> {
        let entry = self
            .accounts
            .entry(account)
            .or_default()
            .collateral
            .entry(token)
            .or_insert(0);
        *entry = checked_add(*entry, amount)?;
        Ok(())
    }

    /// Fails with `ArithmeticUnderflow` when `amount` exceeds the recorded
    /// balance; the entry is left untouched in that case.
    pub fn debit_collateral(
        &mut self,
        account: Address,
        token: TokenId,
        amount: u128,
    ) -> EngineResult<()> {
        let entry = self
            .accounts
            .entry(account)
            .or_default()
            .collateral
            .entry(token)
            .or_insert(0);
        *entry = checked_sub(*entry, amount)?;
        Ok(())
    }

    pub fn credit_debt(&mut self, account: Address, amount: u128) -> EngineResult<()> {
        let position = self.accounts.entry(account).or_default();
        position.debt = checked_add(position.debt, amount)?;
        Ok(())
    }

    pub fn debit_debt(&mut self, account: Address, amount: u128) -> EngineResult<()> {
        let position = self.accounts.entry(account).or_default();
        position.debt = checked_sub(position.debt, amount)?;
        Ok(())
    }
}
