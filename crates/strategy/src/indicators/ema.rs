/// EMA (Exponential Moving Average) indicator.
///
/// Recursive: `ema[t] = alpha * close[t] + (1 - alpha) * ema[t-1]` with
/// `alpha = 2 / (period + 1)`, seeded with the SMA of the first `period`
/// values. Returns the latest value only.
#[derive(Debug, Clone)]
pub struct Ema {
    pub period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self { period }
    }

    /// Compute the latest EMA from a slice of close prices (oldest first).
    /// Returns `None` if there are fewer than `period` values.
    pub fn compute(&self, closes: &[f64]) -> Option<f64> {
        if closes.len() < self.period {
            return None;
        }

        let alpha = 2.0 / (self.period as f64 + 1.0);
        let seed = closes[..self.period].iter().sum::<f64>() / self.period as f64;

        Some(
            closes[self.period..]
                .iter()
                .fold(seed, |prev, &close| alpha * close + (1.0 - alpha) * prev),
        )
    }
}
