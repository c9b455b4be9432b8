use common::{Error, PriceSeries, Result, Timeframe};

use crate::indicators::{Adx, Ema};

/// ADX band outside which the market is treated as unsuitable: below the
/// floor there is no directional strength, above the ceiling the trend is
/// likely too extended to pull back safely.
pub const ADX_MIN: f64 = 18.0;
pub const ADX_MAX: f64 = 35.0;

const EMA_MID: usize = 50;
const EMA_SLOW: usize = 200;
const ADX_PERIOD: usize = 14;

/// Trend and regime flags for one instrument, derived from the daily and
/// hourly series at evaluation time. Recomputed every cycle, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendContext {
    /// Daily close above its EMA200.
    pub daily_up: bool,
    /// Daily close below its EMA200.
    pub daily_down: bool,
    /// Hourly close above EMA200 with EMA50 above EMA200.
    pub hourly_up: bool,
    pub hourly_down: bool,
    /// Raw hourly ADX14, kept for diagnostics.
    pub adx_h1: f64,
}

impl TrendContext {
    pub fn derive(daily: &PriceSeries, hourly: &PriceSeries) -> Result<Self> {
        let close_d1 = last_close(daily, Timeframe::D1, EMA_SLOW)?;
        let ema200_d1 = latest_ema(daily, EMA_SLOW, Timeframe::D1)?;

        let close_h1 = last_close(hourly, Timeframe::H1, EMA_SLOW)?;
        let ema50_h1 = latest_ema(hourly, EMA_MID, Timeframe::H1)?;
        let ema200_h1 = latest_ema(hourly, EMA_SLOW, Timeframe::H1)?;

        let adx_h1 = Adx::new(ADX_PERIOD)
            .compute(&hourly.candles)
            .ok_or(Error::InsufficientData {
                timeframe: Timeframe::H1,
                needed: 2 * ADX_PERIOD + 1,
                got: hourly.len(),
            })?;

        Ok(Self {
            daily_up: close_d1 > ema200_d1,
            daily_down: close_d1 < ema200_d1,
            hourly_up: close_h1 > ema200_h1 && ema50_h1 > ema200_h1,
            hourly_down: close_h1 < ema200_h1 && ema50_h1 < ema200_h1,
            adx_h1,
        })
    }

    /// The pullback pattern is only considered reliable inside the ADX band.
    pub fn regime_ok(&self) -> bool {
        (ADX_MIN..=ADX_MAX).contains(&self.adx_h1)
    }
}

fn last_close(series: &PriceSeries, timeframe: Timeframe, needed: usize) -> Result<f64> {
    series
        .last()
        .map(|c| c.close)
        .ok_or(Error::InsufficientData {
            timeframe,
            needed,
            got: 0,
        })
}

fn latest_ema(series: &PriceSeries, period: usize, timeframe: Timeframe) -> Result<f64> {
    Ema::new(period)
        .compute(&series.closes())
        .ok_or(Error::InsufficientData {
            timeframe,
            needed: period,
            got: series.len(),
        })
}
