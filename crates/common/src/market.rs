use async_trait::async_trait;

use crate::{Instrument, PriceSeries, Result, Timeframe};

/// Abstraction over the market-data provider.
///
/// The engine fetches one snapshot per instrument/timeframe at the start of
/// each evaluation pass. A failed fetch skips that instrument for the cycle
/// and must never abort evaluation of the others.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetch the candle history for one instrument at one timeframe.
    async fn fetch(&self, instrument: &Instrument, timeframe: Timeframe) -> Result<PriceSeries>;
}
