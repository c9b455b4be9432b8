use common::{Direction, Error, PriceSeries, Result, Timeframe};

use crate::indicators::{Atr, Ema};
use crate::trend::TrendContext;

/// Candles scanned for the pullback extreme that anchors the stop.
pub const PULLBACK_WINDOW: usize = 5;

const EMA_FAST: usize = 20;
const EMA_PULLBACK: usize = 50;
const ATR_PERIOD: usize = 14;
const SL_ATR_MULT: f64 = 0.8;
const TP_DISTANCE_MULT: f64 = 1.2;
/// Close must sit in the outer 40% of the candle range to count as a rejection.
const REJECTION_RATIO: f64 = 0.6;
/// Guards zero-range candles and zero-distance stops.
const EPSILON: f64 = 1e-6;

/// Entry levels computed once when a signal fires; immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradePlan {
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk_reward: f64,
}

/// Outcome of one entry evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Enter(TradePlan),
    Waiting(WaitReason),
}

/// Why an instrument is not entering this cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaitReason {
    OutOfSession,
    RegimeUnsuitable { adx: f64 },
    TrendMisaligned,
    AwaitingBullishPullback,
    AwaitingBearishPullback,
}

impl std::fmt::Display for WaitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitReason::OutOfSession => write!(f, "Out of session"),
            WaitReason::RegimeUnsuitable { adx } => write!(f, "ADX unsuitable ({adx:.1})"),
            WaitReason::TrendMisaligned => write!(f, "Trends not aligned"),
            WaitReason::AwaitingBullishPullback => write!(f, "Awaiting bullish pullback"),
            WaitReason::AwaitingBearishPullback => write!(f, "Awaiting bearish pullback"),
        }
    }
}

/// Evaluate the pullback + rejection pattern on the fastest timeframe.
///
/// A long fires only with both trends up, the ADX regime in band, the last
/// candle dipping to the EMA50 while closing back above the EMA20, and a
/// bullish rejection close; shorts mirror every condition. Callers gate the
/// trading session before invoking: an out-of-session instrument never
/// reaches the rule.
pub fn evaluate(m15: &PriceSeries, trend: &TrendContext) -> Result<Verdict> {
    let last = *m15.last().ok_or(Error::InsufficientData {
        timeframe: Timeframe::M15,
        needed: EMA_PULLBACK,
        got: 0,
    })?;

    let closes = m15.closes();
    let ema20 = Ema::new(EMA_FAST)
        .compute(&closes)
        .ok_or(insufficient(EMA_FAST, m15.len()))?;
    let ema50 = Ema::new(EMA_PULLBACK)
        .compute(&closes)
        .ok_or(insufficient(EMA_PULLBACK, m15.len()))?;
    let atr = Atr::new(ATR_PERIOD)
        .compute(&m15.candles)
        .ok_or(insufficient(ATR_PERIOD + 1, m15.len()))?;

    if !trend.regime_ok() {
        return Ok(Verdict::Waiting(WaitReason::RegimeUnsuitable {
            adx: trend.adx_h1,
        }));
    }

    let pullback_buy = last.low <= ema50 && last.close > ema20;
    let pullback_sell = last.high >= ema50 && last.close < ema20;

    let range = last.high - last.low + EPSILON;
    let bullish_rejection =
        last.close > last.open && (last.close - last.low) / range > REJECTION_RATIO;
    let bearish_rejection =
        last.close < last.open && (last.high - last.close) / range > REJECTION_RATIO;

    if trend.hourly_up && trend.daily_up {
        if pullback_buy && bullish_rejection {
            let lowest = m15.lowest_low(PULLBACK_WINDOW).unwrap_or(last.low);
            let stop_loss = lowest - atr * SL_ATR_MULT;
            let take_profit = last.close + (last.close - stop_loss) * TP_DISTANCE_MULT;
            return Ok(Verdict::Enter(plan(
                Direction::Long,
                last.close,
                stop_loss,
                take_profit,
            )));
        }
        return Ok(Verdict::Waiting(WaitReason::AwaitingBullishPullback));
    }

    if trend.hourly_down && trend.daily_down {
        if pullback_sell && bearish_rejection {
            let highest = m15.highest_high(PULLBACK_WINDOW).unwrap_or(last.high);
            let stop_loss = highest + atr * SL_ATR_MULT;
            let take_profit = last.close - (stop_loss - last.close) * TP_DISTANCE_MULT;
            return Ok(Verdict::Enter(plan(
                Direction::Short,
                last.close,
                stop_loss,
                take_profit,
            )));
        }
        return Ok(Verdict::Waiting(WaitReason::AwaitingBearishPullback));
    }

    Ok(Verdict::Waiting(WaitReason::TrendMisaligned))
}

fn plan(direction: Direction, entry: f64, stop_loss: f64, take_profit: f64) -> TradePlan {
    let risk_reward = (take_profit - entry).abs() / ((entry - stop_loss).abs() + EPSILON);
    TradePlan {
        direction,
        entry,
        stop_loss,
        take_profit,
        risk_reward,
    }
}

fn insufficient(needed: usize, got: usize) -> Error {
    Error::InsufficientData {
        timeframe: Timeframe::M15,
        needed,
        got,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::Candle;

    fn flat_candle(price: f64) -> Candle {
        Candle {
            open: price,
            high: price,
            low: price,
            close: price,
            timestamp: Utc::now(),
        }
    }

    /// 60 flat candles at `base` followed by one custom final candle.
    fn series_ending_with(base: f64, last: Candle) -> PriceSeries {
        let mut candles = vec![flat_candle(base); 60];
        candles.push(last);
        PriceSeries::new(candles)
    }

    fn bullish_pullback_series() -> PriceSeries {
        // Dips through the EMA50, closes back above the EMA20 near the high.
        series_ending_with(
            1.1000,
            Candle {
                open: 1.0995,
                high: 1.1011,
                low: 1.0950,
                close: 1.1010,
                timestamp: Utc::now(),
            },
        )
    }

    fn bearish_pullback_series() -> PriceSeries {
        series_ending_with(
            1.1000,
            Candle {
                open: 1.1005,
                high: 1.1050,
                low: 1.0989,
                close: 1.0990,
                timestamp: Utc::now(),
            },
        )
    }

    fn uptrend_ctx() -> TrendContext {
        TrendContext {
            daily_up: true,
            daily_down: false,
            hourly_up: true,
            hourly_down: false,
            adx_h1: 25.0,
        }
    }

    fn downtrend_ctx() -> TrendContext {
        TrendContext {
            daily_up: false,
            daily_down: true,
            hourly_up: false,
            hourly_down: true,
            adx_h1: 25.0,
        }
    }

    #[test]
    fn aligned_long_setup_enters_with_ordered_levels() {
        let verdict = evaluate(&bullish_pullback_series(), &uptrend_ctx()).unwrap();
        let Verdict::Enter(plan) = verdict else {
            panic!("expected entry, got {verdict:?}");
        };
        assert_eq!(plan.direction, Direction::Long);
        assert!(plan.stop_loss < plan.entry, "sl {} entry {}", plan.stop_loss, plan.entry);
        assert!(plan.entry < plan.take_profit);
        assert!((plan.risk_reward - 1.2).abs() < 1e-3, "rr {}", plan.risk_reward);
    }

    #[test]
    fn aligned_short_setup_mirrors_levels() {
        let verdict = evaluate(&bearish_pullback_series(), &downtrend_ctx()).unwrap();
        let Verdict::Enter(plan) = verdict else {
            panic!("expected entry, got {verdict:?}");
        };
        assert_eq!(plan.direction, Direction::Short);
        assert!(plan.take_profit < plan.entry);
        assert!(plan.entry < plan.stop_loss);
        assert!((plan.risk_reward - 1.2).abs() < 1e-3);
    }

    #[test]
    fn high_adx_forces_waiting_even_with_perfect_setup() {
        let ctx = TrendContext {
            adx_h1: 40.0,
            ..uptrend_ctx()
        };
        let verdict = evaluate(&bullish_pullback_series(), &ctx).unwrap();
        assert_eq!(
            verdict,
            Verdict::Waiting(WaitReason::RegimeUnsuitable { adx: 40.0 })
        );
    }

    #[test]
    fn misaligned_trends_wait() {
        let ctx = TrendContext {
            daily_up: false,
            ..uptrend_ctx()
        };
        let verdict = evaluate(&bullish_pullback_series(), &ctx).unwrap();
        assert_eq!(verdict, Verdict::Waiting(WaitReason::TrendMisaligned));
    }

    #[test]
    fn uptrend_without_pullback_waits() {
        let series = series_ending_with(1.1000, flat_candle(1.1000));
        let verdict = evaluate(&series, &uptrend_ctx()).unwrap();
        assert_eq!(verdict, Verdict::Waiting(WaitReason::AwaitingBullishPullback));
    }

    #[test]
    fn zero_range_candle_does_not_divide_by_zero() {
        // A doji exactly on the EMAs: range is zero, epsilon keeps the
        // rejection ratio finite and the verdict a clean wait.
        let series = series_ending_with(1.1000, flat_candle(1.1000));
        let verdict = evaluate(&series, &downtrend_ctx()).unwrap();
        assert_eq!(verdict, Verdict::Waiting(WaitReason::AwaitingBearishPullback));
    }

    #[test]
    fn short_series_is_insufficient() {
        let series = PriceSeries::new(vec![flat_candle(1.1); 10]);
        let err = evaluate(&series, &uptrend_ctx()).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { .. }));
    }

    #[test]
    fn wait_reason_reads_as_diagnostic() {
        assert_eq!(
            WaitReason::RegimeUnsuitable { adx: 40.0 }.to_string(),
            "ADX unsuitable (40.0)"
        );
        assert_eq!(WaitReason::OutOfSession.to_string(), "Out of session");
    }
}
