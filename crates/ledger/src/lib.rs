use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::info;

use common::{ActivePosition, Direction, Outcome, ResolvedTrade};

/// Realized risk-reward recorded for every losing trade.
pub const LOSS_RR: f64 = -1.0;

/// Tracks at most one active position per instrument and the append-only
/// history of resolved trades. The ledger is the only writer of both; the
/// engine rebuilds it from the store at the start of every cycle and
/// persists it after every change.
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    active: HashMap<String, ActivePosition>,
    history: Vec<ResolvedTrade>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        active: HashMap<String, ActivePosition>,
        history: Vec<ResolvedTrade>,
    ) -> Self {
        Self { active, history }
    }

    pub fn active(&self) -> &HashMap<String, ActivePosition> {
        &self.active
    }

    pub fn history(&self) -> &[ResolvedTrade] {
        &self.history
    }

    pub fn position(&self, symbol: &str) -> Option<&ActivePosition> {
        self.active.get(symbol)
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.active.contains_key(symbol)
    }

    /// Track a freshly opened position. Returns `false` and leaves the
    /// ledger untouched if the instrument already holds one — exit checks
    /// run before entries, so a duplicate open is a caller bug.
    pub fn open(&mut self, position: ActivePosition) -> bool {
        if self.active.contains_key(&position.symbol) {
            return false;
        }
        info!(
            symbol = %position.symbol,
            direction = %position.direction,
            entry = position.entry,
            sl = position.stop_loss,
            tp = position.take_profit,
            rr = position.risk_reward,
            "Position opened"
        );
        self.active.insert(position.symbol.clone(), position);
        true
    }

    /// Resolve the instrument's position against the latest close, if one
    /// exists and a level was crossed.
    ///
    /// The win branch is evaluated first: a candle whose range spans both
    /// levels settles as a win, because close-only evaluation cannot tell
    /// which level traded first. Changing this order changes the recorded
    /// win rate.
    pub fn check_exit(
        &mut self,
        symbol: &str,
        close: f64,
        now: DateTime<Utc>,
    ) -> Option<ResolvedTrade> {
        let outcome = {
            let position = self.active.get(symbol)?;
            match position.direction {
                Direction::Long => {
                    if close >= position.take_profit {
                        Outcome::Win
                    } else if close <= position.stop_loss {
                        Outcome::Loss
                    } else {
                        return None;
                    }
                }
                Direction::Short => {
                    if close <= position.take_profit {
                        Outcome::Win
                    } else if close >= position.stop_loss {
                        Outcome::Loss
                    } else {
                        return None;
                    }
                }
            }
        };

        let position = self.active.remove(symbol)?;
        let realized_rr = match outcome {
            Outcome::Win => position.risk_reward,
            Outcome::Loss => LOSS_RR,
        };
        let trade = ResolvedTrade {
            symbol: position.symbol,
            direction: position.direction,
            outcome,
            realized_rr,
            closed_at: now,
        };
        info!(
            symbol = %trade.symbol,
            outcome = %trade.outcome,
            rr = trade.realized_rr,
            close = close,
            "Position resolved"
        );
        self.history.push(trade.clone());
        Some(trade)
    }
}

/// Aggregate win rate and cumulative R over a trade history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSummary {
    pub trades: usize,
    pub wins: usize,
    pub cumulative_rr: f64,
}

impl PerformanceSummary {
    pub fn from_history(history: &[ResolvedTrade]) -> Self {
        let wins = history
            .iter()
            .filter(|t| t.outcome == Outcome::Win)
            .count();
        let cumulative_rr = history.iter().map(|t| t.realized_rr).sum();
        Self {
            trades: history.len(),
            wins,
            cumulative_rr,
        }
    }

    pub fn win_rate_pct(&self) -> f64 {
        if self.trades == 0 {
            return 0.0;
        }
        self.wins as f64 / self.trades as f64 * 100.0
    }
}
