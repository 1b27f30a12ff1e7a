//! Append-only trade ledger and per-run counters.

use chrono::NaiveDate;

use super::position::{ClosedPosition, ExitReason};
use super::signal::{BuyTier, Classification, HoldReason, SellReason, Signal};

/// One closed round trip of one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl: f64,
    /// Running account balance after this trade.
    pub capital_after: f64,
    pub holding_days: i64,
    pub signal_strength: f64,
    pub confidence: f64,
    pub trigger_type: BuyTier,
    pub exit_reason: ExitReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeLedger {
    symbol: String,
    starting_capital: f64,
    capital: f64,
    trades: Vec<Trade>,
}

impl TradeLedger {
    pub fn new(symbol: impl Into<String>, starting_capital: f64) -> Self {
        TradeLedger {
            symbol: symbol.into(),
            starting_capital,
            capital: starting_capital,
            trades: Vec::new(),
        }
    }

    /// Append the trade for a closed position and advance the running capital.
    pub fn record(&mut self, closed: &ClosedPosition) -> &Trade {
        let pnl = closed.pnl();
        self.capital += pnl;
        self.trades.push(Trade {
            symbol: self.symbol.clone(),
            entry_date: closed.entry.entry_date,
            exit_date: closed.exit_date,
            entry_price: closed.entry.entry_price,
            exit_price: closed.exit_price,
            pnl,
            capital_after: self.capital,
            holding_days: closed.holding_days(),
            signal_strength: closed.entry.signal_strength,
            confidence: closed.entry.confidence,
            trigger_type: closed.entry.trigger,
            exit_reason: closed.exit_reason,
        });
        &self.trades[self.trades.len() - 1]
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn starting_capital(&self) -> f64 {
        self.starting_capital
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }
}

/// Diagnostic counters for one engine run.
///
/// Trigger counts tally what the classifier fired, whether or not the
/// position tracker acted on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub primary_buys: usize,
    pub fallback_buys: usize,
    pub momentum_buys: usize,
    pub reversal_sells: usize,
    pub fallback_sells: usize,
    pub momentum_sells: usize,
    pub weak_signals: usize,
    pub degenerate_thresholds: usize,
    pub trades_closed: usize,
}

impl RunSummary {
    pub fn observe(&mut self, classification: &Classification) {
        match classification.signal {
            Signal::Buy { tier, .. } => match tier {
                BuyTier::Primary => self.primary_buys += 1,
                BuyTier::Fallback => self.fallback_buys += 1,
                BuyTier::Momentum => self.momentum_buys += 1,
            },
            Signal::Sell(reason) => match reason {
                SellReason::SentimentReversal => self.reversal_sells += 1,
                SellReason::Fallback => self.fallback_sells += 1,
                SellReason::Momentum => self.momentum_sells += 1,
            },
            Signal::Hold(HoldReason::WeakSignal) => self.weak_signals += 1,
            Signal::Hold(HoldReason::DegenerateThreshold) => self.degenerate_thresholds += 1,
            Signal::Hold(HoldReason::NoRuleMatched) => {}
        }
    }

    pub fn total_buys(&self) -> usize {
        self.primary_buys + self.fallback_buys + self.momentum_buys
    }

    pub fn total_sells(&self) -> usize {
        self.reversal_sells + self.fallback_sells + self.momentum_sells
    }
}
