//! Per-period signal classification.
//!
//! Rules are evaluated in a fixed order and the first match wins:
//!
//! 1. strength gate: `price_delta / price_threshold` (zero threshold is no signal)
//! 2. primary BUY:  sentiment above baseline and delta above baseline
//! 3. fallback BUY: non-negative sentiment and delta >= ratio * baseline
//! 4. momentum BUY: delta >= momentum multiplier * baseline
//! 5. sentiment-reversal SELL: negative sentiment on a down period
//! 6. fallback SELL: delta < fallback multiplier * baseline
//! 7. momentum SELL: delta < momentum multiplier * baseline
//!
//! The classifier does not know whether a position is open. Whether a
//! signal is actionable is decided by the position tracker.

use std::fmt;

use super::config::{EngineConfig, StrengthGate};
use super::observation::{Observation, PriceTrend};
use super::thresholds::Thresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuyTier {
    Primary,
    Fallback,
    Momentum,
}

impl BuyTier {
    pub const ALL: [BuyTier; 3] = [BuyTier::Primary, BuyTier::Fallback, BuyTier::Momentum];
}

impl fmt::Display for BuyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuyTier::Primary => write!(f, "primary"),
            BuyTier::Fallback => write!(f, "fallback"),
            BuyTier::Momentum => write!(f, "momentum"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellReason {
    SentimentReversal,
    Fallback,
    Momentum,
}

impl fmt::Display for SellReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SellReason::SentimentReversal => write!(f, "sentiment_reversal"),
            SellReason::Fallback => write!(f, "fallback"),
            SellReason::Momentum => write!(f, "momentum"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    /// The price baseline is zero, so strength is undefined.
    DegenerateThreshold,
    /// Strength below the configured minimum.
    WeakSignal,
    NoRuleMatched,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    Hold(HoldReason),
    Buy { tier: BuyTier, confidence: f64 },
    Sell(SellReason),
}

impl Signal {
    pub fn is_buy(&self) -> bool {
        matches!(self, Signal::Buy { .. })
    }

    pub fn is_sell(&self) -> bool {
        matches!(self, Signal::Sell(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub signal: Signal,
    /// `None` when the price baseline is degenerate.
    pub signal_strength: Option<f64>,
}

/// `price_delta / price_threshold`, or `None` if the ratio is not finite.
pub fn signal_strength(price_delta: f64, price_threshold: f64) -> Option<f64> {
    if price_threshold == 0.0 {
        return None;
    }
    let strength = price_delta / price_threshold;
    strength.is_finite().then_some(strength)
}

pub fn classify(
    observation: &Observation,
    thresholds: &Thresholds,
    config: &EngineConfig,
) -> Classification {
    let Some(strength) = signal_strength(observation.price_delta, thresholds.price) else {
        return Classification {
            signal: Signal::Hold(HoldReason::DegenerateThreshold),
            signal_strength: None,
        };
    };

    let weak = strength < config.min_signal_strength;
    let signal = match (weak, config.strength_gate) {
        (true, StrengthGate::All) => Signal::Hold(HoldReason::WeakSignal),
        (true, StrengthGate::Entries) => match sell_rule(observation, thresholds, config) {
            Some(reason) => Signal::Sell(reason),
            None => Signal::Hold(HoldReason::WeakSignal),
        },
        (false, _) => match buy_rule(observation, thresholds, config) {
            Some((tier, confidence)) => Signal::Buy { tier, confidence },
            None => match sell_rule(observation, thresholds, config) {
                Some(reason) => Signal::Sell(reason),
                None => Signal::Hold(HoldReason::NoRuleMatched),
            },
        },
    };

    Classification {
        signal,
        signal_strength: Some(strength),
    }
}

fn buy_rule(obs: &Observation, t: &Thresholds, config: &EngineConfig) -> Option<(BuyTier, f64)> {
    let delta = obs.price_delta;
    let sentiment = obs.sentiment_score;

    if sentiment > t.sentiment && delta > t.price {
        let confidence = (sentiment - t.sentiment) + (delta - t.price);
        return Some((BuyTier::Primary, confidence));
    }
    if sentiment >= 0.0 && delta >= config.fallback_buy_ratio * t.price {
        return Some((BuyTier::Fallback, (delta / t.price) * 0.5));
    }
    if delta >= config.momentum_buy_threshold * t.price {
        return Some((BuyTier::Momentum, delta));
    }
    None
}

fn sell_rule(obs: &Observation, t: &Thresholds, config: &EngineConfig) -> Option<SellReason> {
    let delta = obs.price_delta;

    if obs.sentiment_score < 0.0 && obs.price_trend == PriceTrend::Down {
        return Some(SellReason::SentimentReversal);
    }
    if delta < config.fallback_sell_threshold * t.price {
        return Some(SellReason::Fallback);
    }
    if delta < config.momentum_sell_threshold * t.price {
        return Some(SellReason::Momentum);
    }
    None
}
