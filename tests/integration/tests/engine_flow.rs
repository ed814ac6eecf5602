//! End-to-end flows against the public engine surface

use std::rc::Rc;

use caldera_engine::testkit::{InMemoryFeed, InMemoryToken, ManualClock};
use caldera_engine::{
    calculate_health_factor, Address, Clock, CollateralSource, Engine, EngineError, EngineEvent,
    FeedId, LiabilityToken, PriceSource, TokenId, MAX_PRICE_AGE_SECS, MIN_HEALTH_FACTOR,
};
use caldera_integration_tests::{Market, E18, START};

#[test]
fn queries_report_registry_and_prices() {
    let market = Market::new(2_000_00000000);

    assert_eq!(market.engine.registered_collateral_tokens(), vec![market.token]);
    assert_eq!(market.engine.price_feed_of(market.token).unwrap(), market.feed_id);
    assert_eq!(
        market.engine.price_feed_of(TokenId::new_unique()),
        Err(EngineError::TokenNotAllowed)
    );

    let round = market.engine.price_of(market.token).unwrap();
    assert_eq!(round.price, 2_000_00000000);
    assert_eq!(round.updated_at, START);

    // 15 units at 2000 -> 30_000 USD; 100 USD -> 0.05 units
    assert_eq!(
        market.engine.usd_value_of(market.token, 15 * E18).unwrap(),
        30_000 * E18
    );
    assert_eq!(
        market
            .engine
            .token_amount_from_usd(market.token, 100 * E18)
            .unwrap(),
        E18 / 20
    );
}

#[test]
fn calculate_health_factor_is_callable_without_any_state() {
    assert_eq!(calculate_health_factor(0, 12345), u128::MAX);
    assert_eq!(
        calculate_health_factor(100 * E18, 200 * E18),
        MIN_HEALTH_FACTOR
    );
}

#[test]
fn full_lifecycle_deposit_mint_crash_liquidate() {
    let market = Market::new(2_000_00000000);
    let borrower = market.open_position(10, 100);
    assert!(market.engine.health_factor(borrower).unwrap() >= MIN_HEALTH_FACTOR);

    // the liquidator provisions their own synthetic dollars up front
    let liquidator = market.open_position(1_000, 100);
    market.engine.drain_events();

    // collapse: 10 units now back only 180 USD of value
    market.set_price(18_00000000);
    let before = market.engine.health_factor(borrower).unwrap();
    assert!(before < MIN_HEALTH_FACTOR);

    market
        .engine
        .liquidate(liquidator, market.token, borrower, 100 * E18)
        .unwrap();

    let after = market.engine.health_factor(borrower).unwrap();
    assert!(after > before);
    assert!(after > MIN_HEALTH_FACTOR);

    // seized collateral (plus the 10% bonus) went to the liquidator
    let seized = 100 * E18 * E18 / (18 * E18);
    let total = seized + seized / 10;
    assert_eq!(market.collateral.balance_of(liquidator), total);
    assert_eq!(
        market.engine.drain_events(),
        vec![EngineEvent::CollateralRedeemed {
            from: borrower,
            to: liquidator,
            token: market.token,
            amount: total,
        }]
    );
}

#[test]
fn redeem_for_debt_closes_a_position() {
    let market = Market::new(2_000_00000000);
    let borrower = market.open_position(10, 100);

    market
        .engine
        .redeem_collateral_for_debt(borrower, market.token, 10 * E18, 100 * E18)
        .unwrap();

    let (debt, value) = market.engine.account_info(borrower).unwrap();
    assert_eq!(debt, 0);
    assert_eq!(value, 0);
    assert_eq!(market.collateral.balance_of(borrower), 10 * E18);
    assert_eq!(market.liability.balance_of(borrower), 0);
    assert_eq!(market.liability.total_supply(), 0);
}

#[test]
fn stale_price_freezes_redeem_but_not_burn() {
    let market = Market::new(2_000_00000000);
    let borrower = market.open_position(10, 100);

    market.clock.advance(MAX_PRICE_AGE_SECS + 1);

    // redeem needs a valuation and must freeze
    assert_eq!(
        market.engine.redeem_collateral(borrower, market.token, E18),
        Err(EngineError::StalePrice)
    );
    assert_eq!(market.engine.collateral_balance(borrower, market.token), 10 * E18);

    // burning debt needs no price at all
    market.engine.burn_debt(borrower, 100 * E18).unwrap();
    let (debt, _) = {
        market.set_price(2_000_00000000);
        market.engine.account_info(borrower).unwrap()
    };
    assert_eq!(debt, 0);
}

#[test]
fn account_info_sums_value_across_collateral_tokens() {
    let custody = Address::new_unique();
    let token_a = TokenId::new_unique();
    let token_b = TokenId::new_unique();
    let collateral_a = Rc::new(InMemoryToken::new(custody));
    let collateral_b = Rc::new(InMemoryToken::new(custody));
    let liability = Rc::new(InMemoryToken::new(custody));
    let clock = Rc::new(ManualClock::new(START));
    let feed_a = Rc::new(InMemoryFeed::new(2_000_00000000, START));
    let feed_b = Rc::new(InMemoryFeed::new(30_000_00000000, START));

    let engine = Engine::new(
        custody,
        vec![
            (token_a, Rc::clone(&collateral_a) as Rc<dyn CollateralSource>),
            (token_b, Rc::clone(&collateral_b) as Rc<dyn CollateralSource>),
        ],
        vec![
            (FeedId::new_unique(), Rc::clone(&feed_a) as Rc<dyn PriceSource>),
            (FeedId::new_unique(), Rc::clone(&feed_b) as Rc<dyn PriceSource>),
        ],
        liability as Rc<dyn LiabilityToken>,
        clock as Rc<dyn Clock>,
    )
    .unwrap();

    let user = Address::new_unique();
    collateral_a.set_balance(user, 10 * E18);
    collateral_b.set_balance(user, 2 * E18);
    engine.deposit_collateral(user, token_a, 10 * E18).unwrap();
    engine.deposit_collateral(user, token_b, 2 * E18).unwrap();

    // 10 * 2000 + 2 * 30000 = 80_000 USD
    let (debt, value) = engine.account_info(user).unwrap();
    assert_eq!(debt, 0);
    assert_eq!(value, 80_000 * E18);

    // debt is backed by the combined value: cap is 40_000
    engine.mint_debt(user, 40_000 * E18).unwrap();
    assert_eq!(engine.health_factor(user).unwrap(), MIN_HEALTH_FACTOR);

    // one stale feed freezes the whole valuation
    feed_b.set_updated_at(START - MAX_PRICE_AGE_SECS - 1);
    assert_eq!(engine.account_info(user), Err(EngineError::StalePrice));
}

#[test]
fn liquidation_seizes_only_the_named_collateral_token() {
    let custody = Address::new_unique();
    let token_a = TokenId::new_unique();
    let token_b = TokenId::new_unique();
    let collateral_a = Rc::new(InMemoryToken::new(custody));
    let collateral_b = Rc::new(InMemoryToken::new(custody));
    let liability = Rc::new(InMemoryToken::new(custody));
    let clock = Rc::new(ManualClock::new(START));
    let feed_a = Rc::new(InMemoryFeed::new(2_000_00000000, START));
    let feed_b = Rc::new(InMemoryFeed::new(100_00000000, START));

    let engine = Engine::new(
        custody,
        vec![
            (token_a, Rc::clone(&collateral_a) as Rc<dyn CollateralSource>),
            (token_b, Rc::clone(&collateral_b) as Rc<dyn CollateralSource>),
        ],
        vec![
            (FeedId::new_unique(), Rc::clone(&feed_a) as Rc<dyn PriceSource>),
            (FeedId::new_unique(), Rc::clone(&feed_b) as Rc<dyn PriceSource>),
        ],
        Rc::clone(&liability) as Rc<dyn LiabilityToken>,
        clock as Rc<dyn Clock>,
    )
    .unwrap();

    // 1 * 2000 + 50 * 100 = 7000 USD backing 3000 debt
    let borrower = Address::new_unique();
    collateral_a.set_balance(borrower, E18);
    collateral_b.set_balance(borrower, 50 * E18);
    engine.deposit_collateral(borrower, token_a, E18).unwrap();
    engine.deposit_collateral(borrower, token_b, 50 * E18).unwrap();
    engine.mint_debt(borrower, 3_000 * E18).unwrap();

    let liquidator = Address::new_unique();
    collateral_a.set_balance(liquidator, 200 * E18);
    engine
        .deposit_collateral_and_mint_debt(liquidator, token_a, 200 * E18, 3_000 * E18)
        .unwrap();

    // token_a collapses to 1: the borrower's value drops to 5001
    feed_a.set_price(1_00000000);
    assert!(engine.health_factor(borrower).unwrap() < MIN_HEALTH_FACTOR);

    engine
        .liquidate(liquidator, token_b, borrower, 3_000 * E18)
        .unwrap();

    // 30 units of token_b plus the 10% bonus changed hands; token_a was
    // never touched
    assert_eq!(engine.collateral_balance(borrower, token_a), E18);
    assert_eq!(engine.collateral_balance(borrower, token_b), 17 * E18);
    assert_eq!(collateral_b.balance_of(liquidator), 33 * E18);
    assert_eq!(collateral_a.balance_of(liquidator), 0);
    let (debt, _) = engine.account_info(borrower).unwrap();
    assert_eq!(debt, 0);
}
