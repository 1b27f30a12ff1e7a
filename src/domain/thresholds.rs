//! Rolling baseline thresholds.
//!
//! Each threshold is the mean of a trailing window ending at (and including)
//! the current period. The window is truncated to the available prefix for
//! the first `window - 1` periods, so every period has a value. No value
//! depends on a later period.

use super::observation::Observation;

/// Baselines for one period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub sentiment: f64,
    pub price: f64,
}

impl Thresholds {
    pub fn new(sentiment: f64, price: f64) -> Self {
        Thresholds { sentiment, price }
    }
}

/// Trailing mean of `values` over `window` periods, minimum one sample.
///
/// Every window is summed from scratch rather than with a running sum, so a
/// window that cancels exactly yields exactly zero.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return Vec::new();
    }

    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Thresholds for every observation, aligned 1:1 with the input.
pub fn compute_thresholds(observations: &[Observation], window: usize) -> Vec<Thresholds> {
    let sentiment: Vec<f64> = observations.iter().map(|o| o.sentiment_score).collect();
    let price: Vec<f64> = observations.iter().map(|o| o.price_delta).collect();

    rolling_mean(&sentiment, window)
        .into_iter()
        .zip(rolling_mean(&price, window))
        .map(|(s, p)| Thresholds::new(s, p))
        .collect()
}
