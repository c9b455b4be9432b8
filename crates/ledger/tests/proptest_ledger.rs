use chrono::Utc;
use proptest::prelude::*;

use common::{ActivePosition, Direction, Outcome};
use ledger::{Ledger, LOSS_RR};

fn position(direction: Direction, entry: f64, sl: f64, tp: f64, rr: f64) -> ActivePosition {
    ActivePosition {
        symbol: "EURUSD".to_string(),
        direction,
        entry,
        stop_loss: sl,
        take_profit: tp,
        risk_reward: rr,
        opened_at: Utc::now(),
    }
}

proptest! {
    /// Exit checks on arbitrary finite closes never panic, and a resolved
    /// trade always records either the opening RR or exactly -1.0.
    #[test]
    fn realized_rr_is_opening_rr_or_minus_one(
        entry in 0.0001f64..1_000_000.0f64,
        sl_gap in 0.0001f64..1000.0f64,
        tp_gap in 0.0001f64..1000.0f64,
        closes in prop::collection::vec(0.0001f64..2_000_000.0f64, 1..50),
        long in any::<bool>(),
    ) {
        let (direction, sl, tp) = if long {
            (Direction::Long, entry - sl_gap, entry + tp_gap)
        } else {
            (Direction::Short, entry + sl_gap, entry - tp_gap)
        };
        let rr = tp_gap / sl_gap;

        let mut ledger = Ledger::new();
        prop_assert!(ledger.open(position(direction, entry, sl, tp, rr)));

        for close in closes {
            if let Some(trade) = ledger.check_exit("EURUSD", close, Utc::now()) {
                match trade.outcome {
                    Outcome::Win => prop_assert_eq!(trade.realized_rr, rr),
                    Outcome::Loss => prop_assert_eq!(trade.realized_rr, LOSS_RR),
                }
                prop_assert!(!ledger.has_position("EURUSD"));
                break;
            }
            // Unresolved: the position and its levels are untouched
            let open = ledger.position("EURUSD").unwrap();
            prop_assert_eq!(open.risk_reward, rr);
            prop_assert_eq!(open.stop_loss, sl);
            prop_assert_eq!(open.take_profit, tp);
        }
    }

    /// However entries and exits interleave, an instrument never holds more
    /// than one position and history length only grows.
    #[test]
    fn single_position_invariant_under_interleaving(
        ops in prop::collection::vec((any::<bool>(), 0.5f64..2.0f64), 1..100),
    ) {
        let mut ledger = Ledger::new();
        let mut last_history_len = 0;

        for (try_open, close) in ops {
            if try_open {
                ledger.open(position(Direction::Long, 1.0, 0.9, 1.1, 1.0));
            } else {
                ledger.check_exit("EURUSD", close, Utc::now());
            }
            prop_assert!(ledger.active().len() <= 1);
            prop_assert!(ledger.history().len() >= last_history_len);
            last_history_len = ledger.history().len();
        }
    }
}
