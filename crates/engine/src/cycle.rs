use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use common::{
    ActivePosition, Direction, Error, Instrument, MarketData, NotificationSink, Result,
    SignalLabel, SignalReport, Timeframe,
};
use ledger::Ledger;
use store::Store;
use strategy::entry::{self, TradePlan, Verdict, WaitReason};
use strategy::{SessionClock, TrendContext};

/// Per-instrument result of one cycle. A skip means the instrument could
/// not be evaluated this pass (short or corrupt series, provider failure)
/// and carries the reason; it never aborts the rest of the cycle.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    Report(SignalReport),
    Skip { symbol: String, reason: String },
}

/// Orchestrates one evaluation pass over all instruments: exit detection
/// first, then session gate, trend context and the entry rule, with ledger
/// changes persisted and announced as they happen.
pub struct SignalEngine {
    instruments: Vec<Instrument>,
    market: Arc<dyn MarketData>,
    store: Arc<Store>,
    notifier: Option<Arc<dyn NotificationSink>>,
    session: SessionClock,
}

impl SignalEngine {
    pub fn new(
        instruments: Vec<Instrument>,
        market: Arc<dyn MarketData>,
        store: Arc<Store>,
        notifier: Option<Arc<dyn NotificationSink>>,
        session: SessionClock,
    ) -> Self {
        Self {
            instruments,
            market,
            store,
            notifier,
            session,
        }
    }

    pub async fn run_cycle(&self) -> Result<Vec<CycleOutcome>> {
        self.run_cycle_at(Utc::now()).await
    }

    /// One full pass at the given wall-clock instant. Exposed separately so
    /// session-gated behavior is reproducible from tests.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<Vec<CycleOutcome>> {
        // State is re-read at every cycle start: operator commands may have
        // cleared it since the last pass.
        let active = self.store.load_positions().await?;
        let history = self.store.load_history().await?;
        let mut ledger = Ledger::from_parts(active, history);

        let mut outcomes = Vec::with_capacity(self.instruments.len());
        for instrument in &self.instruments {
            match self.evaluate(instrument, &mut ledger, now).await {
                Ok(report) => outcomes.push(CycleOutcome::Report(report)),
                Err(e) => {
                    debug!(symbol = %instrument.symbol, error = %e, "instrument skipped this cycle");
                    outcomes.push(CycleOutcome::Skip {
                        symbol: instrument.symbol.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let signals = outcomes
            .iter()
            .filter(|o| matches!(o, CycleOutcome::Report(r) if r.signal != SignalLabel::Waiting))
            .count();
        let skips = outcomes
            .iter()
            .filter(|o| matches!(o, CycleOutcome::Skip { .. }))
            .count();
        info!(
            instruments = self.instruments.len(),
            signals,
            skips,
            open_positions = ledger.active().len(),
            "cycle complete"
        );
        Ok(outcomes)
    }

    async fn evaluate(
        &self,
        instrument: &Instrument,
        ledger: &mut Ledger,
        now: DateTime<Utc>,
    ) -> Result<SignalReport> {
        let m15 = self.market.fetch(instrument, Timeframe::M15).await?;
        m15.validate(&instrument.symbol, Timeframe::M15)?;
        let close = m15
            .last()
            .map(|c| c.close)
            .ok_or(Error::InsufficientData {
                timeframe: Timeframe::M15,
                needed: 1,
                got: 0,
            })?;

        // Exit detection takes priority over new entries; an instrument
        // holding a position produces no new signal this cycle.
        if ledger.has_position(&instrument.symbol) {
            return Ok(match ledger.check_exit(&instrument.symbol, close, now) {
                Some(trade) => {
                    self.persist(ledger).await;
                    waiting_report(
                        instrument,
                        close,
                        format!(
                            "Position closed: {} ({:+.2} R)",
                            trade.outcome, trade.realized_rr
                        ),
                    )
                }
                None => waiting_report(instrument, close, "Position open, awaiting TP/SL".into()),
            });
        }

        if !self.session.is_open(instrument.category, now) {
            return Ok(waiting_report(
                instrument,
                close,
                WaitReason::OutOfSession.to_string(),
            ));
        }

        let h1 = self.market.fetch(instrument, Timeframe::H1).await?;
        h1.validate(&instrument.symbol, Timeframe::H1)?;
        let d1 = self.market.fetch(instrument, Timeframe::D1).await?;
        d1.validate(&instrument.symbol, Timeframe::D1)?;

        let trend = TrendContext::derive(&d1, &h1)?;
        match entry::evaluate(&m15, &trend)? {
            Verdict::Waiting(reason) => Ok(waiting_report(instrument, close, reason.to_string())),
            Verdict::Enter(plan) => {
                let position = ActivePosition {
                    symbol: instrument.symbol.clone(),
                    direction: plan.direction,
                    entry: plan.entry,
                    stop_loss: plan.stop_loss,
                    take_profit: plan.take_profit,
                    risk_reward: plan.risk_reward,
                    opened_at: now,
                };
                if ledger.open(position.clone()) {
                    self.persist(ledger).await;
                    self.announce(&position).await;
                } else {
                    warn!(symbol = %position.symbol, "entry signal while already holding a position");
                }
                Ok(entry_report(instrument, &plan))
            }
        }
    }

    /// Persistence failures are reported and dropped, never rolled back:
    /// in-memory state is already correct and the next cycle rewrites the
    /// full documents.
    async fn persist(&self, ledger: &Ledger) {
        if let Err(e) = self.store.save_positions(ledger.active()).await {
            warn!(error = %e, "failed to persist active positions");
        }
        if let Err(e) = self.store.save_history(ledger.history()).await {
            warn!(error = %e, "failed to persist trade history");
        }
    }

    async fn announce(&self, position: &ActivePosition) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let text = format!(
            "🎯 {} {}\nEntry: {:.5}\nSL: {:.5}\nTP: {:.5}\nRR: {:.2}",
            position.symbol,
            position.direction,
            position.entry,
            position.stop_loss,
            position.take_profit,
            position.risk_reward
        );
        notifier.notify(&text).await;
    }
}

fn waiting_report(instrument: &Instrument, price: f64, comment: String) -> SignalReport {
    SignalReport {
        symbol: instrument.symbol.clone(),
        category: instrument.category,
        signal: SignalLabel::Waiting,
        price,
        stop_loss: None,
        stop_loss_pips: None,
        take_profit: None,
        take_profit_pips: None,
        comment,
    }
}

fn entry_report(instrument: &Instrument, plan: &TradePlan) -> SignalReport {
    let factor = instrument.pip_factor();
    SignalReport {
        symbol: instrument.symbol.clone(),
        category: instrument.category,
        signal: match plan.direction {
            Direction::Long => SignalLabel::Long,
            Direction::Short => SignalLabel::Short,
        },
        price: plan.entry,
        stop_loss: Some(plan.stop_loss),
        stop_loss_pips: Some((plan.entry - plan.stop_loss).abs() * factor),
        take_profit: Some(plan.take_profit),
        take_profit_pips: Some((plan.take_profit - plan.entry).abs() * factor),
        comment: "Pullback + daily trend aligned".into(),
    }
}
