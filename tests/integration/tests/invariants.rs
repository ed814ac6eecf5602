//! Randomized operation sequences against the engine
//!
//! The driver sequences deposits, mints, redeems, and burns in random
//! order and amounts, then checks after every call that no account sits
//! below the solvency floor and that the engine's books balance against
//! the external token state.

use caldera_engine::{Address, EngineError, MIN_HEALTH_FACTOR};
use caldera_integration_tests::{Market, E18};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Deposit { user: usize, units: u64 },
    Mint { user: usize, usd: u64 },
    Redeem { user: usize, units: u64 },
    Burn { user: usize, usd: u64 },
}

const USERS: usize = 4;

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..USERS, 0..50u64).prop_map(|(user, units)| Op::Deposit { user, units }),
        (0..USERS, 0..5_000u64).prop_map(|(user, usd)| Op::Mint { user, usd }),
        (0..USERS, 0..50u64).prop_map(|(user, units)| Op::Redeem { user, units }),
        (0..USERS, 0..5_000u64).prop_map(|(user, usd)| Op::Burn { user, usd }),
    ]
}

fn apply(market: &Market, users: &[Address], op: &Op) -> Result<(), EngineError> {
    match *op {
        Op::Deposit { user, units } => {
            market
                .engine
                .deposit_collateral(users[user], market.token, units as u128 * E18)
        }
        Op::Mint { user, usd } => market.engine.mint_debt(users[user], usd as u128 * E18),
        Op::Redeem { user, units } => {
            market
                .engine
                .redeem_collateral(users[user], market.token, units as u128 * E18)
        }
        Op::Burn { user, usd } => market.engine.burn_debt(users[user], usd as u128 * E18),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn random_sequences_preserve_solvency_and_conservation(
        ops in proptest::collection::vec(op_strategy(), 1..40)
    ) {
        let market = Market::new(2_000_00000000);
        let users: Vec<Address> = (0..USERS).map(|_| market.funded_account(1_000)).collect();

        for op in &ops {
            // failures are fine; they must leave no trace
            let _ = apply(&market, &users, op);

            // solvency: nobody sits below the floor after any call
            for user in &users {
                let health = market.engine.health_factor(*user).unwrap();
                prop_assert!(
                    health >= MIN_HEALTH_FACTOR,
                    "account below floor after {:?}: {}",
                    op,
                    health
                );
            }

            // conservation: custody holds exactly the recorded collateral,
            // and liability supply matches recorded debt
            let recorded: u128 = users
                .iter()
                .map(|u| market.engine.collateral_balance(*u, market.token))
                .sum();
            prop_assert_eq!(market.collateral.balance_of(market.custody), recorded);

            let debt: u128 = users
                .iter()
                .map(|u| market.engine.account_info(*u).unwrap().0)
                .sum();
            prop_assert_eq!(market.liability.total_supply(), debt);
        }
    }

    #[test]
    fn conversion_round_trip_loses_at_most_one_unit(
        price_e8 in 1_00000000i128..100_000_00000000i128,
        amount in 0u128..10_000 * E18,
    ) {
        let market = Market::new(price_e8);
        let usd = market.engine.usd_value_of(market.token, amount).unwrap();
        let back = market.engine.token_amount_from_usd(market.token, usd).unwrap();
        prop_assert!(back <= amount);
        prop_assert!(amount - back <= 1, "lost {} units", amount - back);
    }

    #[test]
    fn liquidation_restores_health_or_leaves_no_trace(
        crash_price_e8 in 1_00000000i128..20_00000000i128,
        debt_usd in 100u64..5_000u64,
    ) {
        let market = Market::new(2_000_00000000);
        let borrower = market.open_position(10, debt_usd as u128);
        // provisioned while the price is still good
        let liquidator = market.open_position(1_000, debt_usd as u128);

        market.set_price(crash_price_e8);

        let debt_before = debt_usd as u128 * E18;
        let collateral_before = market.engine.collateral_balance(borrower, market.token);
        let liability_before = market.liability.balance_of(liquidator);

        match market
            .engine
            .liquidate(liquidator, market.token, borrower, debt_before)
        {
            Ok(()) => {
                let health = market.engine.health_factor(borrower).unwrap();
                prop_assert!(health > MIN_HEALTH_FACTOR);
                let (debt, _) = market.engine.account_info(borrower).unwrap();
                prop_assert_eq!(debt, 0);
            }
            Err(EngineError::HealthFactorOk) => {
                // the crash was not deep enough for this position
                let health = market.engine.health_factor(borrower).unwrap();
                prop_assert!(health >= MIN_HEALTH_FACTOR);
            }
            Err(EngineError::ArithmeticUnderflow) => {
                // the uncapped base seizure exceeded the deposited balance;
                // the operation must leave no trace
                let (debt, _) = market.engine.account_info(borrower).unwrap();
                prop_assert_eq!(debt, debt_before);
                prop_assert_eq!(
                    market.engine.collateral_balance(borrower, market.token),
                    collateral_before
                );
                prop_assert_eq!(market.liability.balance_of(liquidator), liability_before);
            }
            Err(other) => prop_assert!(false, "unexpected liquidation failure: {other}"),
        }
    }
}
