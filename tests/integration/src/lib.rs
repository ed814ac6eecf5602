//! Shared harness for Caldera integration tests
//!
//! Builds an engine against the in-memory capability doubles from
//! `caldera_engine::testkit` and exposes the handles tests need to move
//! prices, advance time, and inspect external balances.

use std::rc::Rc;

use caldera_engine::testkit::{InMemoryFeed, InMemoryToken, ManualClock};
use caldera_engine::{
    Address, Clock, CollateralSource, Engine, FeedId, LiabilityToken, PriceSource, TokenId,
    PRECISION,
};

pub const E18: u128 = PRECISION;
pub const START: u64 = 1_700_000_000;

/// A market with one registered collateral token.
pub struct Market {
    pub engine: Engine,
    pub custody: Address,
    pub token: TokenId,
    pub feed_id: FeedId,
    pub collateral: Rc<InMemoryToken>,
    pub liability: Rc<InMemoryToken>,
    pub feed: Rc<InMemoryFeed>,
    pub clock: Rc<ManualClock>,
}

impl Market {
    pub fn new(price_e8: i128) -> Self {
        let custody = Address::new_unique();
        let token = TokenId::new_unique();
        let feed_id = FeedId::new_unique();
        let collateral = Rc::new(InMemoryToken::new(custody));
        let liability = Rc::new(InMemoryToken::new(custody));
        let clock = Rc::new(ManualClock::new(START));
        let feed = Rc::new(InMemoryFeed::new(price_e8, START));
        let engine = Engine::new(
            custody,
            vec![(token, Rc::clone(&collateral) as Rc<dyn CollateralSource>)],
            vec![(feed_id, Rc::clone(&feed) as Rc<dyn PriceSource>)],
            Rc::clone(&liability) as Rc<dyn LiabilityToken>,
            Rc::clone(&clock) as Rc<dyn Clock>,
        )
        .expect("single-token registry is valid");
        Self {
            engine,
            custody,
            token,
            feed_id,
            collateral,
            liability,
            feed,
            clock,
        }
    }

    /// Account holding `units` collateral tokens in its wallet.
    pub fn funded_account(&self, units: u128) -> Address {
        let account = Address::new_unique();
        self.collateral.set_balance(account, units * E18);
        account
    }

    /// Account that deposited `units` collateral and minted `debt_usd`.
    pub fn open_position(&self, units: u128, debt_usd: u128) -> Address {
        let account = self.funded_account(units);
        self.engine
            .deposit_collateral_and_mint_debt(account, self.token, units * E18, debt_usd * E18)
            .expect("position within the collateral threshold");
        account
    }

    /// Publish a new price in the current clock second.
    pub fn set_price(&self, price_e8: i128) {
        self.feed.update(price_e8, self.clock.now());
    }
}
