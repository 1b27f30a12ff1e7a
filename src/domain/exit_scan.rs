//! Forward exit-scan engine.
//!
//! Entries are taken at fixed points rather than from per-period
//! classification. From each entry the scanner walks forward to the first
//! period whose momentum either moves far enough (volatility exit) or
//! disagrees in sign with the entry sentiment (divergence exit). Each
//! completed round trip is then labelled BUY, SELL or HOLD. HOLD trades are
//! still evaluated and kept in [`ScanReport::evaluated`], but are dropped
//! from [`ScanReport::trades`].

use chrono::NaiveDate;
use std::fmt;

use super::config::ScanConfig;
use super::error::SentiError;
use super::observation::{validate_series, Observation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitTrigger {
    /// `|momentum| >= volatility_exit_threshold`.
    Volatility,
    /// Momentum sign disagrees with the entry sentiment sign.
    Divergence,
}

impl fmt::Display for ExitTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitTrigger::Volatility => write!(f, "volatility"),
            ExitTrigger::Divergence => write!(f, "divergence"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalSignal {
    Buy,
    Sell,
    Hold,
}

impl FinalSignal {
    pub fn is_actionable(&self) -> bool {
        !matches!(self, FinalSignal::Hold)
    }
}

impl fmt::Display for FinalSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalSignal::Buy => write!(f, "BUY"),
            FinalSignal::Sell => write!(f, "SELL"),
            FinalSignal::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanExit {
    pub exit_index: usize,
    pub momentum_score: f64,
    pub trigger: ExitTrigger,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanTrade {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: i64,
    /// Capital committed at entry.
    pub capital: f64,
    pub pnl: f64,
    pub holding_days: i64,
    pub momentum_score: f64,
    pub sentiment_score: f64,
    pub exit_trigger: ExitTrigger,
    pub final_signal: FinalSignal,
}

impl ScanTrade {
    pub fn reason(&self) -> &'static str {
        if self.final_signal.is_actionable() {
            "signal passed"
        } else {
            "signal suppressed"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanReport {
    /// Every completed round trip, HOLD included, in entry order.
    pub evaluated: Vec<ScanTrade>,
    /// The BUY/SELL subset of `evaluated`.
    pub trades: Vec<ScanTrade>,
}

impl ScanReport {
    pub fn held(&self) -> impl Iterator<Item = &ScanTrade> {
        self.evaluated
            .iter()
            .filter(|t| !t.final_signal.is_actionable())
    }
}

/// `(close - entry_price) / entry_price`.
pub fn momentum_score(close: f64, entry_price: f64) -> f64 {
    (close - entry_price) / entry_price
}

/// Scan forward from `entry_index + 1` for the first qualifying exit.
///
/// Returns `None` if the series ends first.
pub fn scan_exit(
    observations: &[Observation],
    entry_index: usize,
    entry_price: f64,
    entry_sentiment: f64,
    config: &ScanConfig,
) -> Option<ScanExit> {
    observations
        .iter()
        .enumerate()
        .skip(entry_index + 1)
        .find_map(|(j, obs)| {
            let momentum = momentum_score(obs.close, entry_price);
            let trigger = if momentum.abs() >= config.volatility_exit_threshold {
                ExitTrigger::Volatility
            } else if (momentum > 0.0 && entry_sentiment < 0.0)
                || (momentum < 0.0 && entry_sentiment > 0.0)
            {
                ExitTrigger::Divergence
            } else {
                return None;
            };
            Some(ScanExit {
                exit_index: j,
                momentum_score: momentum,
                trigger,
            })
        })
}

pub fn classify_round_trip(momentum: f64, sentiment: f64, config: &ScanConfig) -> FinalSignal {
    if momentum > config.momentum_buy && sentiment >= config.sentiment_buy {
        FinalSignal::Buy
    } else if momentum < config.momentum_sell && sentiment <= config.sentiment_sell {
        FinalSignal::Sell
    } else {
        FinalSignal::Hold
    }
}

/// Walk entry points from the start of the series.
///
/// Entries fill at the period open and exits at the period close. After an
/// exit at `j` the next entry is `j + 1`. The walk stops at the first entry
/// whose scan runs off the end of the series.
pub fn run_exit_scan(
    observations: &[Observation],
    config: &ScanConfig,
) -> Result<ScanReport, SentiError> {
    config.validate()?;
    validate_series(observations)?;

    let mut evaluated = Vec::new();
    let mut i = 0;
    while i + 1 < observations.len() {
        let entry = &observations[i];
        let entry_price = entry.open;
        let sentiment = entry.sentiment_score;

        let Some(exit) = scan_exit(observations, i, entry_price, sentiment, config) else {
            tracing::debug!(
                symbol = %entry.symbol,
                date = %entry.date,
                "no qualifying exit before end of data"
            );
            break;
        };

        let exit_obs = &observations[exit.exit_index];
        let final_signal = classify_round_trip(exit.momentum_score, sentiment, config);
        let trade = ScanTrade {
            symbol: entry.symbol.clone(),
            entry_date: entry.date,
            exit_date: exit_obs.date,
            entry_price,
            exit_price: exit_obs.close,
            quantity: 1,
            capital: entry_price,
            pnl: exit_obs.close - entry_price,
            holding_days: (exit_obs.date - entry.date).num_days(),
            momentum_score: exit.momentum_score,
            sentiment_score: sentiment,
            exit_trigger: exit.trigger,
            final_signal,
        };
        tracing::debug!(
            symbol = %trade.symbol,
            date = %trade.entry_date,
            signal = %trade.final_signal,
            momentum_pct = round2(trade.momentum_score * 100.0),
            sentiment_pct = round2(trade.sentiment_score * 100.0),
            reason = trade.reason(),
            "evaluated round trip"
        );
        evaluated.push(trade);

        i = exit.exit_index + 1;
    }

    let trades = evaluated
        .iter()
        .filter(|t| t.final_signal.is_actionable())
        .cloned()
        .collect();

    Ok(ScanReport { evaluated, trades })
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
