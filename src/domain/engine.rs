//! Threshold-driven backtest engine.
//!
//! One chronological pass per symbol: classify each period against its
//! rolling thresholds, feed the result to the position tracker, and append
//! every exit to the ledger. Symbols share no state, so a universe of
//! symbols is run in parallel.

use rayon::prelude::*;

use super::config::EngineConfig;
use super::error::SentiError;
use super::ledger::{RunSummary, Trade, TradeLedger};
use super::observation::{validate_series, Observation};
use super::position::{ExitReason, OpenPosition, PositionTracker, Transition};
use super::signal::{classify, Signal};
use super::thresholds::{compute_thresholds, Thresholds};

/// Everything one symbol's run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRun {
    pub symbol: String,
    pub trades: Vec<Trade>,
    pub summary: RunSummary,
    /// Position still open after the last observation. Never traded unless
    /// `close_open_at_end` is set.
    pub open_position: Option<OpenPosition>,
    pub final_capital: f64,
}

/// Validate, compute rolling thresholds, then walk the series.
pub fn run_backtest(
    observations: &[Observation],
    config: &EngineConfig,
) -> Result<BacktestRun, SentiError> {
    config.validate()?;
    validate_series(observations)?;
    let thresholds = compute_thresholds(observations, config.window_width);
    walk(observations, &thresholds, config)
}

/// Walk the series against caller-supplied thresholds, aligned 1:1.
pub fn run_with_thresholds(
    observations: &[Observation],
    thresholds: &[Thresholds],
    config: &EngineConfig,
) -> Result<BacktestRun, SentiError> {
    config.validate()?;
    validate_series(observations)?;
    if thresholds.len() != observations.len() {
        return Err(SentiError::ThresholdMismatch {
            observations: observations.len(),
            thresholds: thresholds.len(),
        });
    }
    walk(observations, thresholds, config)
}

/// Run every symbol independently. Results keep the input order; the first
/// failing symbol aborts the whole run.
pub fn run_universe(
    universe: &[(String, Vec<Observation>)],
    config: &EngineConfig,
) -> Result<Vec<BacktestRun>, SentiError> {
    config.validate()?;
    universe
        .par_iter()
        .map(|(symbol, observations)| {
            let mut run = run_backtest(observations, config)?;
            if run.symbol.is_empty() {
                run.symbol = symbol.clone();
            }
            Ok(run)
        })
        .collect()
}

fn walk(
    observations: &[Observation],
    thresholds: &[Thresholds],
    config: &EngineConfig,
) -> Result<BacktestRun, SentiError> {
    let symbol = observations
        .first()
        .map(|o| o.symbol.clone())
        .unwrap_or_default();

    let mut tracker = PositionTracker::new();
    let mut ledger = TradeLedger::new(symbol.clone(), config.starting_capital);
    let mut summary = RunSummary::default();

    for (index, (obs, t)) in observations.iter().zip(thresholds).enumerate() {
        let classification = classify(obs, t, config);
        summary.observe(&classification);

        match tracker.apply(index, obs, &classification) {
            Transition::Entered => {
                if let Signal::Buy { tier, confidence } = classification.signal {
                    tracing::debug!(
                        symbol = %symbol,
                        date = %obs.date,
                        %tier,
                        confidence,
                        strength = classification.signal_strength.unwrap_or(0.0),
                        "entered position"
                    );
                }
            }
            Transition::Exited(closed) => {
                let trade = ledger.record(&closed);
                tracing::debug!(
                    symbol = %symbol,
                    date = %obs.date,
                    reason = %trade.exit_reason,
                    pnl = trade.pnl,
                    holding_days = trade.holding_days,
                    "closed position"
                );
            }
            Transition::Unchanged => {
                if classification.signal.is_buy() || classification.signal.is_sell() {
                    tracing::trace!(
                        symbol = %symbol,
                        date = %obs.date,
                        open = tracker.is_open(),
                        "signal not applicable to current position"
                    );
                }
            }
        }
    }

    if config.close_open_at_end {
        if let Some(last_index) = observations.len().checked_sub(1) {
            let entered_before_last = tracker
                .open_position()
                .is_some_and(|p| p.entry_index < last_index);
            if entered_before_last {
                if let Transition::Exited(closed) =
                    tracker.force_close(last_index, &observations[last_index], ExitReason::EndOfData)
                {
                    ledger.record(&closed);
                }
            }
        }
    }

    summary.trades_closed = ledger.len();
    let open_position = tracker.open_position().cloned();
    if let Some(pos) = &open_position {
        tracing::debug!(
            symbol = %symbol,
            entry_date = %pos.entry_date,
            "position left open at end of data"
        );
    }

    tracing::info!(
        symbol = %symbol,
        observations = observations.len(),
        trades = summary.trades_closed,
        final_capital = ledger.capital(),
        "backtest finished"
    );

    Ok(BacktestRun {
        symbol,
        final_capital: ledger.capital(),
        trades: ledger.into_trades(),
        summary,
        open_position,
    })
}
