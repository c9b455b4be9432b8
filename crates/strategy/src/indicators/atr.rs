use common::Candle;

/// ATR (Average True Range) indicator.
///
/// True range: `max(high - low, |high - prev_close|, |low - prev_close|)`,
/// smoothed with Wilder's moving average (alpha = 1/period). Returns the
/// latest value only. Needs `period + 1` candles: the first bar has no
/// previous close and is excluded from the true-range series.
#[derive(Debug, Clone)]
pub struct Atr {
    pub period: usize,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self { period }
    }

    /// Compute the latest ATR from candles (oldest first).
    /// Returns `None` if there are fewer than `period + 1` candles.
    pub fn compute(&self, candles: &[Candle]) -> Option<f64> {
        if candles.len() < self.period + 1 {
            return None;
        }
        let tr = true_range(candles);
        wilder_latest(&tr, self.period)
    }
}

/// True-range series starting from the second candle (the first has no
/// previous close to gap against).
pub(crate) fn true_range(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|w| {
            let (prev, cur) = (&w[0], &w[1]);
            (cur.high - cur.low)
                .max((cur.high - prev.close).abs())
                .max((cur.low - prev.close).abs())
        })
        .collect()
}

/// Latest Wilder-smoothed value of a series: seed with the mean of the
/// first `period` values, then `alpha = 1/period` recursion over the rest.
pub(crate) fn wilder_latest(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let seed = values[..period].iter().sum::<f64>() / period as f64;
    let alpha = 1.0 / period as f64;
    Some(
        values[period..]
            .iter()
            .fold(seed, |prev, &v| alpha * v + (1.0 - alpha) * prev),
    )
}
