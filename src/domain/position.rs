//! Single-symbol position state machine.
//!
//! `Flat --BUY--> Open --SELL--> Flat`. A BUY while open or a SELL while flat
//! is ignored. Closing a position hands back a [`ClosedPosition`]; turning it
//! into a trade record is the ledger's job.

use chrono::NaiveDate;
use std::fmt;

use super::observation::Observation;
use super::signal::{BuyTier, Classification, SellReason, Signal};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Signal(SellReason),
    /// Forced close at the final observation.
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Signal(reason) => write!(f, "{reason}"),
            ExitReason::EndOfData => write!(f, "end_of_data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub entry_index: usize,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub trigger: BuyTier,
    pub signal_strength: f64,
    pub confidence: f64,
}

impl OpenPosition {
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        price - self.entry_price
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedPosition {
    pub entry: OpenPosition,
    pub exit_index: usize,
    pub exit_price: f64,
    pub exit_date: NaiveDate,
    pub exit_reason: ExitReason,
}

impl ClosedPosition {
    /// One unit of quantity.
    pub fn pnl(&self) -> f64 {
        self.exit_price - self.entry.entry_price
    }

    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry.entry_date).num_days()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Open(OpenPosition),
}

/// Result of feeding one classified period to the tracker.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Entered,
    Exited(ClosedPosition),
    /// Signal not applicable to the current state, or no signal.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PositionTracker {
    state: PositionState,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PositionState::Open(_))
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn open_position(&self) -> Option<&OpenPosition> {
        match &self.state {
            PositionState::Open(p) => Some(p),
            PositionState::Flat => None,
        }
    }

    /// Apply one period's classification. Entries fill at the period close.
    pub fn apply(
        &mut self,
        index: usize,
        observation: &Observation,
        classification: &Classification,
    ) -> Transition {
        match (self.is_open(), classification.signal) {
            (false, Signal::Buy { tier, confidence }) => {
                self.state = PositionState::Open(OpenPosition {
                    entry_index: index,
                    entry_price: observation.close,
                    entry_date: observation.date,
                    trigger: tier,
                    signal_strength: classification.signal_strength.unwrap_or(0.0),
                    confidence,
                });
                Transition::Entered
            }
            (true, Signal::Sell(reason)) => {
                self.close(index, observation, ExitReason::Signal(reason))
            }
            _ => Transition::Unchanged,
        }
    }

    /// Close whatever is open at this observation's close.
    pub fn force_close(
        &mut self,
        index: usize,
        observation: &Observation,
        reason: ExitReason,
    ) -> Transition {
        if !self.is_open() {
            return Transition::Unchanged;
        }
        self.close(index, observation, reason)
    }

    fn close(&mut self, index: usize, observation: &Observation, reason: ExitReason) -> Transition {
        match std::mem::take(&mut self.state) {
            PositionState::Open(entry) => Transition::Exited(ClosedPosition {
                entry,
                exit_index: index,
                exit_price: observation.close,
                exit_date: observation.date,
                exit_reason: reason,
            }),
            PositionState::Flat => Transition::Unchanged,
        }
    }
}
