use common::Candle;

use super::atr::{true_range, wilder_latest};

/// ADX (Average Directional Index, Wilder) indicator.
///
/// Steps: +DM/-DM from consecutive bars, Wilder-smoothed DM and TR,
/// `DI = 100 * smoothed(DM) / smoothed(TR)`,
/// `DX = 100 * |+DI - -DI| / (+DI + -DI)`, ADX = Wilder-smoothed DX.
/// Lookback is `2 * period` (one for DI smoothing, one for ADX smoothing).
#[derive(Debug, Clone)]
pub struct Adx {
    pub period: usize,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self { period }
    }

    /// Compute the latest ADX from candles (oldest first).
    /// Returns `None` if there are fewer than `2 * period + 1` candles.
    pub fn compute(&self, candles: &[Candle]) -> Option<f64> {
        let period = self.period;
        if candles.len() < 2 * period + 1 {
            return None;
        }

        let tr = true_range(candles);
        let mut plus_dm = Vec::with_capacity(tr.len());
        let mut minus_dm = Vec::with_capacity(tr.len());
        for w in candles.windows(2) {
            let high_diff = w[1].high - w[0].high;
            let low_diff = w[0].low - w[1].low;
            plus_dm.push(if high_diff > low_diff && high_diff > 0.0 {
                high_diff
            } else {
                0.0
            });
            minus_dm.push(if low_diff > high_diff && low_diff > 0.0 {
                low_diff
            } else {
                0.0
            });
        }

        let smooth_tr = wilder_series(&tr, period);
        let smooth_plus = wilder_series(&plus_dm, period);
        let smooth_minus = wilder_series(&minus_dm, period);

        let dx: Vec<f64> = smooth_tr
            .iter()
            .zip(smooth_plus.iter())
            .zip(smooth_minus.iter())
            .map(|((&tr, &plus), &minus)| {
                if tr <= 0.0 {
                    return 0.0;
                }
                let plus_di = 100.0 * plus / tr;
                let minus_di = 100.0 * minus / tr;
                let di_sum = plus_di + minus_di;
                if di_sum == 0.0 {
                    0.0
                } else {
                    100.0 * (plus_di - minus_di).abs() / di_sum
                }
            })
            .collect();

        wilder_latest(&dx, period)
    }
}

/// Full Wilder-smoothed series: the seed mean followed by the `alpha = 1/period`
/// recursion, one output per input from the seed onward.
fn wilder_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }
    let seed = values[..period].iter().sum::<f64>() / period as f64;
    let alpha = 1.0 / period as f64;

    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(seed);
    let mut prev = seed;
    for &v in &values[period..] {
        prev = alpha * v + (1.0 - alpha) * prev;
        out.push(prev);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_candles(data: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
        data.iter()
            .map(|&(open, high, low, close)| Candle {
                open,
                high,
                low,
                close,
                timestamp: Utc::now(),
            })
            .collect()
    }

    fn strong_uptrend(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let base = 100.0 + i as f64 * 5.0;
                Candle {
                    open: base - 1.0,
                    high: base + 3.0,
                    low: base - 3.0,
                    close: base + 2.0,
                    timestamp: Utc::now(),
                }
            })
            .collect()
    }

    #[test]
    fn adx_returns_none_with_insufficient_data() {
        let adx = Adx::new(14);
        let candles = make_candles(&[(100.0, 105.0, 95.0, 102.0); 28]); // need 29
        assert!(adx.compute(&candles).is_none());
    }

    #[test]
    fn adx_stays_within_bounds() {
        let candles = make_candles(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0),
            (106.0, 107.0, 98.0, 99.0),
            (99.0, 103.0, 97.0, 101.0),
            (101.0, 106.0, 100.0, 105.0),
            (105.0, 110.0, 103.0, 108.0),
            (108.0, 112.0, 106.0, 110.0),
            (110.0, 111.0, 104.0, 105.0),
            (105.0, 109.0, 103.0, 107.0),
            (107.0, 113.0, 105.0, 112.0),
        ]);
        let value = Adx::new(3).compute(&candles).unwrap();
        assert!((0.0..=100.0).contains(&value), "ADX out of bounds: {value}");
    }

    #[test]
    fn adx_elevated_in_strong_trend() {
        let value = Adx::new(5).compute(&strong_uptrend(30)).unwrap();
        assert!(value > 20.0, "expected elevated ADX, got {value}");
    }

    #[test]
    fn adx_zero_on_flat_market() {
        // Identical bars: no directional movement at all
        let candles = make_candles(&[(100.0, 101.0, 99.0, 100.0); 40]);
        let value = Adx::new(14).compute(&candles).unwrap();
        assert!(value.abs() < 1e-9, "flat market should have ADX 0, got {value}");
    }

    #[test]
    fn adx_is_deterministic() {
        let candles = strong_uptrend(40);
        let adx = Adx::new(14);
        let a = adx.compute(&candles).unwrap();
        let b = adx.compute(&candles).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
