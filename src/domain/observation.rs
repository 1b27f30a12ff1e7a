//! Per-period market/sentiment observation and series validation.

use chrono::NaiveDate;
use std::fmt;

use super::error::SentiError;

/// Direction of a single period's price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceTrend {
    Up,
    Down,
}

impl PriceTrend {
    /// `Up` only for a strictly positive delta; a flat period counts as `Down`.
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 { PriceTrend::Up } else { PriceTrend::Down }
    }
}

impl fmt::Display for PriceTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceTrend::Up => write!(f, "up"),
            PriceTrend::Down => write!(f, "down"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
    pub price_delta: f64,
    pub sentiment_score: f64,
    pub price_trend: PriceTrend,
}

impl Observation {
    pub fn new(
        symbol: impl Into<String>,
        date: NaiveDate,
        open: f64,
        close: f64,
        sentiment_score: f64,
    ) -> Self {
        let price_delta = close - open;
        Observation {
            symbol: symbol.into(),
            date,
            open,
            close,
            price_delta,
            sentiment_score,
            price_trend: PriceTrend::from_delta(price_delta),
        }
    }

    /// Same bar with a different sentiment score.
    pub fn with_sentiment(&self, sentiment_score: f64) -> Self {
        Observation {
            sentiment_score,
            ..self.clone()
        }
    }
}

/// Check that a single-symbol series is well formed before it reaches the engine.
///
/// Rejects non-finite or non-positive prices, non-finite sentiment, a
/// `price_delta` that disagrees with `close - open`, mixed symbols, and
/// timestamps that are not strictly increasing. Rows are never coerced.
pub fn validate_series(observations: &[Observation]) -> Result<(), SentiError> {
    let Some(first) = observations.first() else {
        return Ok(());
    };

    let mut prev_date: Option<NaiveDate> = None;
    for (index, obs) in observations.iter().enumerate() {
        let fail = |reason: String| SentiError::MalformedObservation {
            symbol: obs.symbol.clone(),
            index,
            date: obs.date,
            reason,
        };

        if obs.symbol != first.symbol {
            return Err(fail(format!(
                "symbol {} does not match series symbol {}",
                obs.symbol, first.symbol
            )));
        }
        if !obs.open.is_finite() || obs.open <= 0.0 {
            return Err(fail(format!("open must be a positive number, got {}", obs.open)));
        }
        if !obs.close.is_finite() || obs.close <= 0.0 {
            return Err(fail(format!(
                "close must be a positive number, got {}",
                obs.close
            )));
        }
        if !obs.sentiment_score.is_finite() {
            return Err(fail(format!(
                "sentiment_score is not finite: {}",
                obs.sentiment_score
            )));
        }
        let expected = obs.close - obs.open;
        if (obs.price_delta - expected).abs() > 1e-9 * expected.abs().max(1.0) {
            return Err(fail(format!(
                "price_delta {} does not equal close - open ({})",
                obs.price_delta, expected
            )));
        }
        if obs.price_trend != PriceTrend::from_delta(obs.price_delta) {
            return Err(fail(format!(
                "price_trend {} disagrees with price_delta {}",
                obs.price_trend, obs.price_delta
            )));
        }
        if let Some(prev) = prev_date {
            if obs.date <= prev {
                return Err(fail(format!(
                    "timestamp {} is not after previous timestamp {}",
                    obs.date, prev
                )));
            }
        }
        prev_date = Some(obs.date);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn series() -> Vec<Observation> {
        vec![
            Observation::new("AAA", day(1), 100.0, 101.0, 0.2),
            Observation::new("AAA", day(2), 101.0, 100.5, -0.1),
            Observation::new("AAA", day(4), 100.5, 100.5, 0.0),
        ]
    }

    #[test]
    fn new_derives_delta_and_trend() {
        let obs = Observation::new("AAA", day(1), 100.0, 103.5, 0.4);
        assert!((obs.price_delta - 3.5).abs() < f64::EPSILON);
        assert_eq!(obs.price_trend, PriceTrend::Up);

        let down = Observation::new("AAA", day(1), 100.0, 98.0, 0.4);
        assert_eq!(down.price_trend, PriceTrend::Down);
    }

    #[test]
    fn flat_bar_is_down() {
        let obs = Observation::new("AAA", day(1), 50.0, 50.0, 0.0);
        assert_eq!(obs.price_trend, PriceTrend::Down);
    }

    #[test]
    fn with_sentiment_keeps_prices() {
        let obs = Observation::new("AAA", day(1), 10.0, 12.0, 0.0).with_sentiment(-1.0);
        assert_eq!(obs.sentiment_score, -1.0);
        assert_eq!(obs.close, 12.0);
        assert_eq!(obs.price_trend, PriceTrend::Up);
    }

    #[test]
    fn valid_series_passes() {
        assert!(validate_series(&series()).is_ok());
    }

    #[test]
    fn empty_series_passes() {
        assert!(validate_series(&[]).is_ok());
    }

    #[test]
    fn non_monotonic_dates_fail_with_index() {
        let mut s = series();
        s[2].date = day(2);
        let err = validate_series(&s).unwrap_err();
        assert!(matches!(err, SentiError::MalformedObservation { index: 2, .. }));
    }

    #[test]
    fn nan_close_fails() {
        let mut s = series();
        s[1] = Observation::new("AAA", day(2), 101.0, f64::NAN, 0.0);
        let err = validate_series(&s).unwrap_err();
        assert!(
            matches!(err, SentiError::MalformedObservation { index: 1, ref reason, .. } if reason.contains("close"))
        );
    }

    #[test]
    fn non_positive_open_fails() {
        let mut s = series();
        s[0] = Observation::new("AAA", day(1), 0.0, 1.0, 0.0);
        assert!(validate_series(&s).is_err());
    }

    #[test]
    fn infinite_sentiment_fails() {
        let mut s = series();
        s[0].sentiment_score = f64::INFINITY;
        assert!(validate_series(&s).is_err());
    }

    #[test]
    fn inconsistent_delta_fails() {
        let mut s = series();
        s[1].price_delta = 5.0;
        let err = validate_series(&s).unwrap_err();
        assert!(
            matches!(err, SentiError::MalformedObservation { ref reason, .. } if reason.contains("price_delta"))
        );
    }

    #[test]
    fn mixed_symbols_fail() {
        let mut s = series();
        s[2].symbol = "BBB".into();
        let err = validate_series(&s).unwrap_err();
        assert!(matches!(err, SentiError::MalformedObservation { index: 2, .. }));
    }
}
