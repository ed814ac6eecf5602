//! In-memory capability implementations for tests and local simulation
//!
//! These doubles stand in for the external tokens, price feeds, and clock.
//! The engine custody address is the implicit sender for `transfer` and the
//! implicit burn target, matching the capability contracts in
//! [`crate::token`].

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::oracle::{Clock, PriceSource, RoundData};
use crate::token::{CollateralSource, LiabilityToken};
use crate::types::Address;

/// Token with balances held in memory. Implements both capability traits so
/// it can serve as a collateral token or as the liability token.
pub struct InMemoryToken {
    custody: Address,
    balances: RefCell<HashMap<Address, u128>>,
    total_supply: Cell<u128>,
    fail_transfers: Cell<bool>,
    fail_mint: Cell<bool>,
}

impl InMemoryToken {
    pub fn new(custody: Address) -> Self {
        Self {
            custody,
            balances: RefCell::new(HashMap::new()),
            total_supply: Cell::new(0),
            fail_transfers: Cell::new(false),
            fail_mint: Cell::new(false),
        }
    }

    pub fn balance_of(&self, account: Address) -> u128 {
        self.balances.borrow().get(&account).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply.get()
    }

    /// Fund an account out of thin air (not counted as minted supply).
    pub fn set_balance(&self, account: Address, amount: u128) {
        self.balances.borrow_mut().insert(account, amount);
    }

    /// Make every subsequent transfer report failure.
    pub fn set_fail_transfers(&self, fail: bool) {
        self.fail_transfers.set(fail);
    }

    /// Make every subsequent mint report failure.
    pub fn set_fail_mint(&self, fail: bool) {
        self.fail_mint.set(fail);
    }

    fn move_between(&self, from: Address, to: Address, amount: u128) -> bool {
        if self.fail_transfers.get() {
            return false;
        }
        let mut balances = self.balances.borrow_mut();
        let from_balance = balances.get(&from).copied().unwrap_or(0);
        let Some(remaining) = from_balance.checked_sub(amount) else {
            return false;
        };
        balances.insert(from, remaining);
        let to_balance = balances.get(&to).copied().unwrap_or(0);
        balances.insert(to, to_balance.saturating_add(amount));
        true
    }
}

impl CollateralSource for InMemoryToken {
    fn transfer(&self, to: Address, amount: u128) -> bool {
        self.move_between(self.custody, to, amount)
    }

    fn transfer_from(&self, from: Address, to: Address, amount: u128) -> bool {
        self.move_between(from, to, amount)
    }
}

impl LiabilityToken for InMemoryToken {
    fn transfer(&self, to: Address, amount: u128) -> bool {
        self.move_between(self.custody, to, amount)
    }

    fn transfer_from(&self, from: Address, to: Address, amount: u128) -> bool {
        self.move_between(from, to, amount)
    }

    fn mint(&self, account: Address, amount: u128) -> bool {
        if self.fail_mint.get() {
            return false;
        }
        let balance = self.balance_of(account);
        self.balances
            .borrow_mut()
            .insert(account, balance.saturating_add(amount));
        self.total_supply
            .set(self.total_supply.get().saturating_add(amount));
        true
    }

    fn burn(&self, amount: u128) {
        let balance = self.balance_of(self.custody);
        self.balances
            .borrow_mut()
            .insert(self.custody, balance.saturating_sub(amount));
        self.total_supply
            .set(self.total_supply.get().saturating_sub(amount));
    }
}

/// Settable price feed.
pub struct InMemoryFeed {
    round_id: Cell<u64>,
    price: Cell<i128>,
    updated_at: Cell<u64>,
}

impl InMemoryFeed {
    pub fn new(price: i128, updated_at: u64) -> Self {
        Self {
            round_id: Cell::new(1),
            price: Cell::new(price),
            updated_at: Cell::new(updated_at),
        }
    }

    /// Publish a new round at the given timestamp.
    pub fn update(&self, price: i128, updated_at: u64) {
        self.round_id.set(self.round_id.get() + 1);
        self.price.set(price);
        self.updated_at.set(updated_at);
    }

    pub fn set_price(&self, price: i128) {
        self.update(price, self.updated_at.get());
    }

    pub fn set_updated_at(&self, updated_at: u64) {
        self.updated_at.set(updated_at);
    }
}

impl PriceSource for InMemoryFeed {
    fn latest_round_data(&self) -> RoundData {
        let round_id = self.round_id.get();
        RoundData {
            round_id,
            price: self.price.get(),
            started_at: self.updated_at.get(),
            updated_at: self.updated_at.get(),
            answered_in_round: round_id,
        }
    }
}

/// Manually advanced clock.
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self { now: Cell::new(now) }
    }

    pub fn set(&self, now: u64) {
        self.now.set(now);
    }

    pub fn advance(&self, secs: u64) {
        self.now.set(self.now.get() + secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.get()
    }
}
