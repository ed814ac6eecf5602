//! Local market simulation the keeper runs against
//!
//! Stands in for a deployed engine: a handful of borrowers lever up against
//! one collateral token, then the price grinds down each tick until some of
//! them cross the solvency floor. The sweep logic in `main` only ever
//! touches the engine's public surface, so it would drive a real deployment
//! the same way.

use std::cell::Cell;
use std::rc::Rc;

use anyhow::Result;
use caldera_engine::testkit::{InMemoryFeed, InMemoryToken, ManualClock};
use caldera_engine::{
    Address, Clock, CollateralSource, Engine, FeedId, LiabilityToken, PriceSource, TokenId,
    PRECISION,
};

const START_PRICE_E8: i128 = 2_000_00000000;
/// The grind stops here so the keeper itself stays solvent.
const FLOOR_PRICE_E8: i128 = 300_00000000;

pub struct SimWorld {
    pub engine: Engine,
    pub keeper: Address,
    pub token: TokenId,
    pub accounts: Vec<Address>,
    feed: Rc<InMemoryFeed>,
    clock: Rc<ManualClock>,
    price_e8: Cell<i128>,
}

impl SimWorld {
    /// Build an engine with one collateral token, fund the keeper with
    /// synthetic dollars to pay for liquidations, and open `borrowers`
    /// positions of increasing leverage.
    pub fn bootstrap(borrowers: usize) -> Result<Self> {
        let custody = Address::new_unique();
        let token = TokenId::new_unique();
        let collateral = Rc::new(InMemoryToken::new(custody));
        let liability = Rc::new(InMemoryToken::new(custody));
        let clock = Rc::new(ManualClock::new(1_700_000_000));
        let feed = Rc::new(InMemoryFeed::new(START_PRICE_E8, clock.now()));

        let engine = Engine::new(
            custody,
            vec![(token, Rc::clone(&collateral) as Rc<dyn CollateralSource>)],
            vec![(FeedId::new_unique(), Rc::clone(&feed) as Rc<dyn PriceSource>)],
            Rc::clone(&liability) as Rc<dyn LiabilityToken>,
            Rc::clone(&clock) as Rc<dyn Clock>,
        )?;

        let keeper = Address::new_unique();
        collateral.set_balance(keeper, 2_000 * PRECISION);
        engine.deposit_collateral_and_mint_debt(
            keeper,
            token,
            2_000 * PRECISION,
            50_000 * PRECISION,
        )?;

        let mut accounts = Vec::with_capacity(borrowers);
        for i in 0..borrowers {
            let account = Address::new_unique();
            collateral.set_balance(account, 10 * PRECISION);
            let debt = (1_600 + 700 * i as u128) * PRECISION;
            engine.deposit_collateral_and_mint_debt(account, token, 10 * PRECISION, debt)?;
            accounts.push(account);
        }

        Ok(Self {
            engine,
            keeper,
            token,
            accounts,
            feed,
            clock,
            price_e8: Cell::new(START_PRICE_E8),
        })
    }

    /// Advance time by `secs` and grind the price down 3%, republishing the
    /// round so it never goes stale.
    pub fn tick(&self, secs: u64) {
        let next = ((self.price_e8.get() * 97) / 100).max(FLOOR_PRICE_E8);
        self.price_e8.set(next);
        self.clock.advance(secs);
        self.feed.update(next, self.clock.now());
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    pub fn price_e8(&self) -> i128 {
        self.price_e8.get()
    }
}
