//! Price feed access with a staleness bound
//!
//! A stale price freezes every valuation-dependent operation rather than
//! letting the engine act on old data. There is no retry and no partial
//! continuation.

use std::rc::Rc;

use crate::constants::MAX_PRICE_AGE_SECS;
use crate::error::{EngineError, EngineResult};
use crate::types::FeedId;

/// One round of price data as reported by the external feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundData {
    pub round_id: u64,
    /// Price with 8 implied decimals.
    pub price: i128,
    pub started_at: u64,
    pub updated_at: u64,
    pub answered_in_round: u64,
}

/// External price source for a single feed.
pub trait PriceSource {
    fn latest_round_data(&self) -> RoundData;
}

/// Time source for staleness checks.
pub trait Clock {
    /// Seconds since the Unix epoch.
    fn now(&self) -> u64;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Wraps a price source and refuses rounds older than [`MAX_PRICE_AGE_SECS`].
pub struct PriceOracle {
    feed: FeedId,
    source: Rc<dyn PriceSource>,
    clock: Rc<dyn Clock>,
}

impl PriceOracle {
    pub fn new(feed: FeedId, source: Rc<dyn PriceSource>, clock: Rc<dyn Clock>) -> Self {
        Self { feed, source, clock }
    }

    pub fn feed(&self) -> FeedId {
        self.feed
    }

    /// Latest round, pulled fresh on every call and never cached. Fails with
    /// `StalePrice` beyond the staleness bound and `InvalidPrice` on a
    /// non-positive answer; all other round fields pass through unchanged.
    pub fn fresh_price(&self) -> EngineResult<RoundData> {
        let round = self.source.latest_round_data();
        let age = self.clock.now().saturating_sub(round.updated_at);
        if age > MAX_PRICE_AGE_SECS {
            return Err(EngineError::StalePrice);
        }
        if round.price <= 0 {
            return Err(EngineError::InvalidPrice);
        }
        Ok(round)
    }
}
