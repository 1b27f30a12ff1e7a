//! Plain-text explanations of a finished run.

use chrono::NaiveDate;

use super::ledger::Trade;
use super::observation::Observation;
use super::thresholds::Thresholds;

/// A period the strategy passed over: neutral sentiment and a price move
/// below the rolling threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkippedSignal {
    pub date: NaiveDate,
    pub price_delta: f64,
}

pub fn skipped_signals(observations: &[Observation], thresholds: &[Thresholds]) -> Vec<SkippedSignal> {
    observations
        .iter()
        .zip(thresholds)
        .filter(|(o, t)| o.sentiment_score == 0.0 && o.price_delta < t.price)
        .map(|(o, _)| SkippedSignal {
            date: o.date,
            price_delta: o.price_delta,
        })
        .collect()
}

pub fn narrate_trade(trade: &Trade) -> String {
    format!(
        "{}: exited after {} days with {:.2} P&L. Confidence: {:.2} via {} (signal strength {:.2}, exit {})",
        trade.exit_date,
        trade.holding_days,
        trade.pnl,
        trade.confidence,
        trade.trigger_type.to_string().to_uppercase(),
        trade.signal_strength,
        trade.exit_reason,
    )
}

pub fn narrate_skipped(skipped: &SkippedSignal) -> String {
    format!(
        "skipped {}: neutral sentiment and weak price delta ({:.2})",
        skipped.date, skipped.price_delta
    )
}
