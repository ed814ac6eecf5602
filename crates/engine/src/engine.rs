//! The issuance engine: deposit, mint, redeem, burn, liquidate
//!
//! Execution is strictly serialized: one top-level operation commits fully
//! or not at all before the next begins. Ledger updates always precede the
//! corresponding external transfer request, and any failure after an
//! external request unwinds the ledger and issues compensating capability
//! calls. A single shared in-flight flag rejects reentrant mutating calls
//! from within the external-call windows.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::constants::{LIQUIDATION_BONUS, LIQUIDATION_PRECISION, MIN_HEALTH_FACTOR};
use crate::error::{EngineError, EngineResult};
use crate::events::EngineEvent;
use crate::health::calculate_health_factor;
use crate::math::{checked_add, mul_div};
use crate::oracle::{Clock, PriceOracle, PriceSource, RoundData};
use crate::price;
use crate::state::Ledger;
use crate::token::{CollateralSource, LiabilityToken};
use crate::types::{Address, FeedId, TokenId};

/// A registered collateral asset: the token, its transfer capability, and
/// the oracle that prices it. The registry is built once at construction
/// and never mutated afterward.
struct CollateralAsset {
    token: TokenId,
    source: Rc<dyn CollateralSource>,
    oracle: PriceOracle,
}

pub struct Engine {
    custody: Address,
    assets: Vec<CollateralAsset>,
    liability: Rc<dyn LiabilityToken>,
    ledger: RefCell<Ledger>,
    events: RefCell<Vec<EngineEvent>>,
    in_flight: Cell<bool>,
}

/// Clears the in-flight flag on every exit path.
struct OpGuard<'a> {
    flag: &'a Cell<bool>,
}

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

fn more_than_zero(amount: u128) -> EngineResult<()> {
    if amount == 0 {
        return Err(EngineError::InvalidAmount);
    }
    Ok(())
}

impl Engine {
    /// Registers every `(token, feed)` pair and binds the liability token.
    /// `custody` is the account external tokens are held under.
    pub fn new(
        custody: Address,
        collateral_tokens: Vec<(TokenId, Rc<dyn CollateralSource>)>,
        price_feeds: Vec<(FeedId, Rc<dyn PriceSource>)>,
        liability: Rc<dyn LiabilityToken>,
        clock: Rc<dyn Clock>,
    ) -> EngineResult<Self> {
        if collateral_tokens.len() != price_feeds.len() {
            return Err(EngineError::LengthMismatch);
        }
        let mut assets: Vec<CollateralAsset> = Vec::with_capacity(collateral_tokens.len());
        for ((token, source), (feed, feed_source)) in
            collateral_tokens.into_iter().zip(price_feeds)
        {
            if assets.iter().any(|asset| asset.token == token) {
                return Err(EngineError::AlreadyRegistered);
            }
            assets.push(CollateralAsset {
                token,
                source,
                oracle: PriceOracle::new(feed, feed_source, Rc::clone(&clock)),
            });
        }
        Ok(Self {
            custody,
            assets,
            liability,
            ledger: RefCell::default(),
            events: RefCell::default(),
            in_flight: Cell::new(false),
        })
    }

    // ------------------------------------------------------------------
    // Mutating operations
    // ------------------------------------------------------------------

    /// Locks `amount` of `token` from `caller` into engine custody.
    pub fn deposit_collateral(
        &self,
        caller: Address,
        token: TokenId,
        amount: u128,
    ) -> EngineResult<()> {
        let _guard = self.enter()?;
        self.deposit_inner(caller, token, amount)
    }

    /// Issues `amount` of debt to `caller`, gated by the solvency invariant.
    pub fn mint_debt(&self, caller: Address, amount: u128) -> EngineResult<()> {
        let _guard = self.enter()?;
        self.mint_inner(caller, amount)
    }

    /// Deposit and mint in one atomic unit: a failed mint leg unwinds the
    /// deposit leg too.
    pub fn deposit_collateral_and_mint_debt(
        &self,
        caller: Address,
        token: TokenId,
        collateral_amount: u128,
        debt_amount: u128,
    ) -> EngineResult<()> {
        let _guard = self.enter()?;
        let events_mark = self.events.borrow().len();
        self.deposit_inner(caller, token, collateral_amount)?;
        if let Err(err) = self.mint_inner(caller, debt_amount) {
            self.ledger
                .borrow_mut()
                .debit_collateral(caller, token, collateral_amount)?;
            let asset = self.asset(token)?;
            let _ = asset.source.transfer(caller, collateral_amount);
            self.events.borrow_mut().truncate(events_mark);
            return Err(err);
        }
        Ok(())
    }

    /// Returns `amount` of `token` from custody to `caller`, then re-checks
    /// the caller's solvency; a violation unwinds the whole operation.
    pub fn redeem_collateral(
        &self,
        caller: Address,
        token: TokenId,
        amount: u128,
    ) -> EngineResult<()> {
        let _guard = self.enter()?;
        let events_mark = self.events.borrow().len();
        self.redeem_inner(caller, caller, token, amount)?;
        if let Err(err) = self.assert_healthy(caller) {
            self.unwind_redeem(caller, caller, token, amount, events_mark)?;
            return Err(err);
        }
        Ok(())
    }

    /// Retires `amount` of `caller`'s debt, paid with the caller's own
    /// liability tokens. Burning can only improve health, so no solvency
    /// check follows.
    pub fn burn_debt(&self, caller: Address, amount: u128) -> EngineResult<()> {
        let _guard = self.enter()?;
        self.burn_inner(caller, caller, amount)
    }

    /// Burn debt, then redeem collateral, as one atomic unit.
    pub fn redeem_collateral_for_debt(
        &self,
        caller: Address,
        token: TokenId,
        collateral_amount: u128,
        debt_amount: u128,
    ) -> EngineResult<()> {
        let _guard = self.enter()?;
        let events_mark = self.events.borrow().len();
        self.burn_inner(caller, caller, debt_amount)?;
        if let Err(err) = self.redeem_inner(caller, caller, token, collateral_amount) {
            self.unwind_burn(caller, caller, debt_amount)?;
            self.events.borrow_mut().truncate(events_mark);
            return Err(err);
        }
        if let Err(err) = self.assert_healthy(caller) {
            self.unwind_redeem(caller, caller, token, collateral_amount, events_mark)?;
            self.unwind_burn(caller, caller, debt_amount)?;
            return Err(err);
        }
        Ok(())
    }

    /// Resolves an undercollateralized account: the caller covers
    /// `debt_to_recover` of the target's debt and receives the equivalent
    /// collateral plus a bonus.
    pub fn liquidate(
        &self,
        caller: Address,
        token: TokenId,
        account: Address,
        debt_to_recover: u128,
    ) -> EngineResult<()> {
        let _guard = self.enter()?;
        more_than_zero(debt_to_recover)?;
        let asset = self.asset(token)?;

        // Liquidation is only permitted against insolvent accounts.
        let starting_health = self.health_factor_inner(account)?;
        if starting_health >= MIN_HEALTH_FACTOR {
            return Err(EngineError::HealthFactorOk);
        }

        let seized = price::token_amount_from_usd(&asset.oracle, debt_to_recover)?;
        let bonus = mul_div(seized, LIQUIDATION_BONUS, LIQUIDATION_PRECISION)?;
        let mut total = checked_add(seized, bonus)?;

        // Cap at the deposited balance only while the base seizure alone
        // still fits; a base amount beyond the balance stays uncapped and
        // fails on the ledger debit below.
        let balance = self.ledger.borrow().collateral_balance(account, token);
        if total > balance && seized <= balance {
            total = balance;
        }

        let events_mark = self.events.borrow().len();
        self.redeem_inner(account, caller, token, total)?;

        if let Err(err) = self.burn_inner(account, caller, debt_to_recover) {
            self.unwind_redeem(account, caller, token, total, events_mark)?;
            return Err(err);
        }

        // The target must end strictly above the floor; the solvency guard
        // then re-runs as an independent backstop.
        let outcome = self.health_factor_inner(account).and_then(|ending| {
            if ending <= MIN_HEALTH_FACTOR {
                return Err(EngineError::HealthFactorNotImproved);
            }
            self.assert_healthy(account)?;
            Ok(ending)
        });
        match outcome {
            Ok(ending_health) => {
                log::info!(
                    "liquidated {}: health {} -> {}, seized {} of {}",
                    account,
                    starting_health,
                    ending_health,
                    total,
                    token
                );
                Ok(())
            }
            Err(err) => {
                self.unwind_burn(account, caller, debt_to_recover)?;
                self.unwind_redeem(account, caller, token, total, events_mark)?;
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Read-only queries
    // ------------------------------------------------------------------

    pub fn custody_address(&self) -> Address {
        self.custody
    }

    /// USD value (18 decimals) of `amount` of `token`.
    pub fn usd_value_of(&self, token: TokenId, amount: u128) -> EngineResult<u128> {
        price::usd_value(&self.asset(token)?.oracle, amount)
    }

    /// Token amount (18 decimals) worth `usd_amount` at the current price.
    pub fn token_amount_from_usd(&self, token: TokenId, usd_amount: u128) -> EngineResult<u128> {
        price::token_amount_from_usd(&self.asset(token)?.oracle, usd_amount)
    }

    /// Latest fresh oracle round for `token`, all fields passed through.
    pub fn price_of(&self, token: TokenId) -> EngineResult<RoundData> {
        self.asset(token)?.oracle.fresh_price()
    }

    /// `(debt_minted, collateral_value_usd)` for `account`.
    pub fn account_info(&self, account: Address) -> EngineResult<(u128, u128)> {
        self.account_info_inner(account)
    }

    pub fn collateral_balance(&self, account: Address, token: TokenId) -> u128 {
        self.ledger.borrow().collateral_balance(account, token)
    }

    pub fn registered_collateral_tokens(&self) -> Vec<TokenId> {
        self.assets.iter().map(|asset| asset.token).collect()
    }

    pub fn price_feed_of(&self, token: TokenId) -> EngineResult<FeedId> {
        Ok(self.asset(token)?.oracle.feed())
    }

    pub fn health_factor(&self, account: Address) -> EngineResult<u128> {
        self.health_factor_inner(account)
    }

    /// Events emitted since the last drain, oldest first.
    pub fn drain_events(&self) -> Vec<EngineEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn enter(&self) -> EngineResult<OpGuard<'_>> {
        if self.in_flight.get() {
            return Err(EngineError::ReentrantCall);
        }
        self.in_flight.set(true);
        Ok(OpGuard {
            flag: &self.in_flight,
        })
    }

    fn asset(&self, token: TokenId) -> EngineResult<&CollateralAsset> {
        self.assets
            .iter()
            .find(|asset| asset.token == token)
            .ok_or(EngineError::TokenNotAllowed)
    }

    fn deposit_inner(&self, caller: Address, token: TokenId, amount: u128) -> EngineResult<()> {
        more_than_zero(amount)?;
        let asset = self.asset(token)?;
        self.ledger
            .borrow_mut()
            .credit_collateral(caller, token, amount)?;
        self.events.borrow_mut().push(EngineEvent::CollateralDeposited {
            account: caller,
            token,
            amount,
        });
        log::debug!("deposit: account={} token={} amount={}", caller, token, amount);
        if !asset.source.transfer_from(caller, self.custody, amount) {
            self.ledger
                .borrow_mut()
                .debit_collateral(caller, token, amount)?;
            self.events.borrow_mut().pop();
            return Err(EngineError::TransferFailed);
        }
        Ok(())
    }

    fn mint_inner(&self, caller: Address, amount: u128) -> EngineResult<()> {
        more_than_zero(amount)?;
        self.ledger.borrow_mut().credit_debt(caller, amount)?;
        if !self.liability.mint(caller, amount) {
            self.ledger.borrow_mut().debit_debt(caller, amount)?;
            return Err(EngineError::MintFailed);
        }
        if let Err(err) = self.assert_healthy(caller) {
            // claw back the units minted above and destroy them
            self.ledger.borrow_mut().debit_debt(caller, amount)?;
            let _ = self.liability.transfer_from(caller, self.custody, amount);
            self.liability.burn(amount);
            return Err(err);
        }
        log::debug!("mint: account={} amount={}", caller, amount);
        Ok(())
    }

    /// Ledger debit, event, then the outbound transfer. No solvency check
    /// here; callers decide when the invariant must be re-established.
    fn redeem_inner(
        &self,
        from: Address,
        to: Address,
        token: TokenId,
        amount: u128,
    ) -> EngineResult<()> {
        more_than_zero(amount)?;
        let asset = self.asset(token)?;
        self.ledger
            .borrow_mut()
            .debit_collateral(from, token, amount)?;
        self.events.borrow_mut().push(EngineEvent::CollateralRedeemed {
            from,
            to,
            token,
            amount,
        });
        log::debug!(
            "redeem: from={} to={} token={} amount={}",
            from,
            to,
            token,
            amount
        );
        if !asset.source.transfer(to, amount) {
            self.ledger
                .borrow_mut()
                .credit_collateral(from, token, amount)?;
            self.events.borrow_mut().pop();
            return Err(EngineError::TransferFailed);
        }
        Ok(())
    }

    fn burn_inner(&self, on_behalf_of: Address, payer: Address, amount: u128) -> EngineResult<()> {
        more_than_zero(amount)?;
        self.ledger.borrow_mut().debit_debt(on_behalf_of, amount)?;
        if !self.liability.transfer_from(payer, self.custody, amount) {
            self.ledger.borrow_mut().credit_debt(on_behalf_of, amount)?;
            return Err(EngineError::TransferFailed);
        }
        self.liability.burn(amount);
        log::debug!("burn: account={} payer={} amount={}", on_behalf_of, payer, amount);
        Ok(())
    }

    /// Restore a redeemed balance: ledger credit plus a compensating pull
    /// of the collateral back into custody.
    fn unwind_redeem(
        &self,
        from: Address,
        to: Address,
        token: TokenId,
        amount: u128,
        events_mark: usize,
    ) -> EngineResult<()> {
        self.ledger
            .borrow_mut()
            .credit_collateral(from, token, amount)?;
        let asset = self.asset(token)?;
        let _ = asset.source.transfer_from(to, self.custody, amount);
        self.events.borrow_mut().truncate(events_mark);
        Ok(())
    }

    /// Restore burned debt: ledger credit plus freshly minted units back to
    /// the payer (the engine holds the mint authority).
    fn unwind_burn(&self, on_behalf_of: Address, payer: Address, amount: u128) -> EngineResult<()> {
        self.ledger.borrow_mut().credit_debt(on_behalf_of, amount)?;
        let _ = self.liability.mint(payer, amount);
        Ok(())
    }

    /// Debt and summed collateral USD value. Balances are copied out before
    /// any oracle call so no ledger borrow is held across external code.
    fn account_info_inner(&self, account: Address) -> EngineResult<(u128, u128)> {
        let (debt, balances) = {
            let ledger = self.ledger.borrow();
            let debt = ledger.debt(account);
            let balances: Vec<u128> = self
                .assets
                .iter()
                .map(|asset| ledger.collateral_balance(account, asset.token))
                .collect();
            (debt, balances)
        };
        let mut collateral_value = 0u128;
        for (asset, balance) in self.assets.iter().zip(balances) {
            if balance == 0 {
                continue;
            }
            collateral_value = checked_add(collateral_value, price::usd_value(&asset.oracle, balance)?)?;
        }
        Ok((debt, collateral_value))
    }

    fn health_factor_inner(&self, account: Address) -> EngineResult<u128> {
        let (debt, collateral_value) = self.account_info_inner(account)?;
        Ok(calculate_health_factor(debt, collateral_value))
    }

    /// Fails with `HealthFactorBelowMin` when `account` sits below the
    /// floor; otherwise returns the computed factor.
    fn assert_healthy(&self, account: Address) -> EngineResult<u128> {
        let health = self.health_factor_inner(account)?;
        if health < MIN_HEALTH_FACTOR {
            return Err(EngineError::HealthFactorBelowMin(health));
        }
        Ok(health)
    }
}
