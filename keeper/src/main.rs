//! Caldera liquidation keeper
//!
//! Service that monitors account health and liquidates
//! undercollateralized positions against a running engine.

mod config;
mod health_queue;
mod sim;

use anyhow::Result;
use caldera_engine::{EngineError, MIN_HEALTH_FACTOR, PRECISION};
use config::Config;
use health_queue::{AccountHealth, HealthQueue};
use sim::SimWorld;
use std::time::Duration;
use tokio::time;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Caldera liquidation keeper");

    // Load configuration
    let config = Config::load().unwrap_or_else(|_| {
        log::warn!("Failed to load config, using local defaults");
        Config::default_local()
    });

    let world = SimWorld::bootstrap(config.borrowers)?;
    log::info!("Keeper account: {}", world.keeper);
    log::info!("Monitoring {} borrower accounts", world.accounts.len());

    let mut queue = HealthQueue::new();
    let mut interval = time::interval(Duration::from_secs(config.poll_interval_secs));

    loop {
        interval.tick().await;
        world.tick(config.poll_interval_secs);

        if let Err(e) = sweep(&world, &mut queue, &config) {
            log::error!("Error processing liquidations: {}", e);
        }

        if let Some(worst) = queue.peek() {
            log::debug!(
                "price={} worst health factor: {:.4}",
                world.price_e8() as f64 / 1e8,
                worst.health_factor as f64 / 1e18
            );
        }
    }
}

/// Refresh health for every watched account and liquidate the worst ones.
fn sweep(world: &SimWorld, queue: &mut HealthQueue, config: &Config) -> Result<()> {
    for account in &world.accounts {
        let (debt, collateral_value) = world.engine.account_info(*account)?;
        let health_factor = world.engine.health_factor(*account)?;
        queue.push(AccountHealth {
            account: *account,
            health_factor,
            debt,
            collateral_value,
            last_update: world.now(),
        });
    }

    let liquidatable = queue.get_liquidatable(MIN_HEALTH_FACTOR);
    if liquidatable.is_empty() {
        log::debug!("No accounts need liquidation");
        return Ok(());
    }

    log::info!("Found {} accounts below the solvency floor", liquidatable.len());

    for target in liquidatable.iter().take(config.max_liquidations_per_sweep) {
        let cap = config.max_debt_to_recover_usd as u128 * PRECISION;
        let debt_to_recover = target.debt.min(cap);

        log::info!(
            "Liquidating {} (health: {:.4}, debt: {:.2}, collateral value: {:.2})",
            target.account,
            target.health_factor as f64 / 1e18,
            target.debt as f64 / 1e18,
            target.collateral_value as f64 / 1e18
        );

        match world
            .engine
            .liquidate(world.keeper, world.token, target.account, debt_to_recover)
        {
            Ok(()) => {
                queue.remove(&target.account);
                log::info!(
                    "Liquidated {}: recovered {:.2} synthetic dollars",
                    target.account,
                    debt_to_recover as f64 / 1e18
                );
            }
            Err(EngineError::HealthFactorOk) => {
                // the price moved between snapshot and call
                queue.remove(&target.account);
            }
            Err(e) => {
                log::warn!("Liquidation of {} failed: {}", target.account, e);
            }
        }
    }

    Ok(())
}
