//! Caldera: an overcollateralized synthetic-dollar issuance engine.
//!
//! Users lock volatile collateral and mint a unit-pegged liability against
//! it. Every state transition either preserves the solvency invariant
//! (health factor >= 1.0 for every account) or does not happen at all;
//! accounts that fall below the floor are restored by an incentive-driven
//! liquidation. External tokens and price feeds are capabilities: the
//! engine depends on traits, never on concrete implementations.

pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod health;
pub mod math;
pub mod oracle;
pub mod price;
pub mod state;
pub mod token;
pub mod types;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use constants::*;
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use events::EngineEvent;
pub use health::calculate_health_factor;
pub use oracle::{Clock, PriceOracle, PriceSource, RoundData, SystemClock};
pub use state::{Ledger, Position};
pub use token::{CollateralSource, LiabilityToken};
pub use types::{Address, FeedId, TokenId};
