use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Asset class of a tradable instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Forex,
    Crypto,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Forex => write!(f, "FOREX"),
            Category::Crypto => write!(f, "CRYPTO"),
        }
    }
}

/// A tradable instrument. Defined at startup, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Plain symbol, e.g. "EURUSD", "GBPJPY", "BTCUSD".
    pub symbol: String,
    pub category: Category,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, category: Category) -> Self {
        Self {
            symbol: symbol.into(),
            category,
        }
    }

    /// Scaling constant converting a raw price difference into pips:
    /// 1 for crypto, 100 for JPY-quoted pairs, 10 000 for everything else.
    pub fn pip_factor(&self) -> f64 {
        match self.category {
            Category::Crypto => 1.0,
            Category::Forex => {
                if self.symbol.contains("JPY") {
                    100.0
                } else {
                    10_000.0
                }
            }
        }
    }
}

/// Chart timeframes evaluated each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    M15,
    H1,
    D1,
}

impl Timeframe {
    /// Provider lookback range requested for this timeframe.
    pub fn range(&self) -> &'static str {
        match self {
            Timeframe::M15 => "7d",
            Timeframe::H1 => "30d",
            Timeframe::D1 => "200d",
        }
    }

    /// Provider bar interval for this timeframe.
    pub fn interval(&self) -> &'static str {
        match self {
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::D1 => "1d",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.interval())
    }
}

/// One OHLC bar. Immutable once produced by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub timestamp: DateTime<Utc>,
}

impl Candle {
    pub fn is_well_formed(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
    }
}

/// Ordered candle sequence for one instrument at one timeframe.
/// Appended by the data source once per cycle, never mutated by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub candles: Vec<Candle>,
}

impl PriceSeries {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self { candles }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// Lowest low over the last `n` candles. `None` on an empty series.
    pub fn lowest_low(&self, n: usize) -> Option<f64> {
        let start = self.candles.len().saturating_sub(n);
        self.candles[start..]
            .iter()
            .map(|c| c.low)
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.min(v))))
    }

    /// Highest high over the last `n` candles. `None` on an empty series.
    pub fn highest_high(&self, n: usize) -> Option<f64> {
        let start = self.candles.len().saturating_sub(n);
        self.candles[start..]
            .iter()
            .map(|c| c.high)
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
    }

    /// Rejects a series containing any non-finite OHLC field. The ingestion
    /// layer drops incomplete rows, so a NaN here means a corrupt snapshot.
    pub fn validate(&self, symbol: &str, timeframe: Timeframe) -> Result<()> {
        if self.candles.iter().all(Candle::is_well_formed) {
            Ok(())
        } else {
            Err(Error::MalformedSeries {
                symbol: symbol.to_string(),
                timeframe,
            })
        }
    }
}

/// Side of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// How a position resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Win,
    Loss,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Win => write!(f, "WIN"),
            Outcome::Loss => write!(f, "LOSS"),
        }
    }
}

/// An open position being tracked for its instrument. Stop-loss, take-profit
/// and risk-reward are fixed at open and never change while the position
/// is alive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivePosition {
    pub symbol: String,
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk_reward: f64,
    pub opened_at: DateTime<Utc>,
}

/// A closed position appended to the history log. Realized RR equals the
/// opening risk-reward on a win and exactly -1.0 on a loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTrade {
    pub symbol: String,
    pub direction: Direction,
    pub outcome: Outcome,
    pub realized_rr: f64,
    pub closed_at: DateTime<Utc>,
}

/// Signal label carried on every per-instrument cycle record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalLabel {
    Long,
    Short,
    Waiting,
}

impl std::fmt::Display for SignalLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalLabel::Long => write!(f, "LONG"),
            SignalLabel::Short => write!(f, "SHORT"),
            SignalLabel::Waiting => write!(f, "WAITING"),
        }
    }
}

/// One output record per instrument per cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReport {
    pub symbol: String,
    pub category: Category,
    pub signal: SignalLabel,
    pub price: f64,
    pub stop_loss: Option<f64>,
    pub stop_loss_pips: Option<f64>,
    pub take_profit: Option<f64>,
    pub take_profit_pips: Option<f64>,
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            open,
            high,
            low,
            close,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn pip_factor_by_instrument() {
        assert_eq!(
            Instrument::new("EURUSD", Category::Forex).pip_factor(),
            10_000.0
        );
        assert_eq!(
            Instrument::new("USDJPY", Category::Forex).pip_factor(),
            100.0
        );
        assert_eq!(Instrument::new("BTCUSD", Category::Crypto).pip_factor(), 1.0);
    }

    #[test]
    fn usdjpy_stop_distance_in_pips() {
        let usdjpy = Instrument::new("USDJPY", Category::Forex);
        let pips = (150.123_f64 - 149.900).abs() * usdjpy.pip_factor();
        assert!((pips - 22.3).abs() < 1e-9, "got {pips}");
    }

    #[test]
    fn lowest_and_highest_over_window() {
        let series = PriceSeries::new(vec![
            candle(1.0, 1.5, 0.5, 1.2), // outside the 3-candle window
            candle(1.2, 1.3, 1.1, 1.25),
            candle(1.25, 1.4, 1.2, 1.3),
            candle(1.3, 1.35, 1.15, 1.2),
        ]);
        assert_eq!(series.lowest_low(3), Some(1.1));
        assert_eq!(series.highest_high(3), Some(1.4));
        // Window larger than the series falls back to the whole series
        assert_eq!(series.lowest_low(10), Some(0.5));
    }

    #[test]
    fn validate_rejects_nan_fields() {
        let mut series = PriceSeries::new(vec![candle(1.0, 1.1, 0.9, 1.05)]);
        assert!(series.validate("EURUSD", Timeframe::M15).is_ok());

        series.candles[0].low = f64::NAN;
        let err = series.validate("EURUSD", Timeframe::M15).unwrap_err();
        assert!(matches!(err, Error::MalformedSeries { .. }));
    }
}
