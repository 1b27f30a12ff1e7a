#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use sentitrader::domain::error::SentiError;
pub use sentitrader::domain::observation::Observation;
use sentitrader::ports::data_port::ObservationPort;
use std::collections::HashMap;
use std::io::Write;
use std::process::ExitCode;

pub struct MockObservationPort {
    pub data: HashMap<String, Vec<Observation>>,
    pub errors: HashMap<String, String>,
}

impl MockObservationPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, symbol: &str, observations: Vec<Observation>) -> Self {
        self.data.insert(symbol.to_string(), observations);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl ObservationPort for MockObservationPort {
    fn fetch_observations(&self, symbol: &str) -> Result<Vec<Observation>, SentiError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SentiError::Data {
                reason: reason.clone(),
            });
        }
        self.data
            .get(symbol)
            .cloned()
            .ok_or_else(|| SentiError::NoData {
                symbol: symbol.to_string(),
            })
    }

    fn list_symbols(&self) -> Result<Vec<String>, SentiError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Day `n` (1-based) of a calendar starting 2024-01-01.
pub fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(n as i64 - 1)
}

/// Consecutive daily bars where each open is the previous close, starting at 100.
pub fn chained_series(symbol: &str, deltas: &[f64], sentiments: &[f64]) -> Vec<Observation> {
    assert_eq!(deltas.len(), sentiments.len());
    let mut open = 100.0;
    deltas
        .iter()
        .zip(sentiments)
        .enumerate()
        .map(|(i, (&delta, &sentiment))| {
            let obs = Observation::new(symbol, day(i as u32 + 1), open, open + delta, sentiment);
            open = obs.close;
            obs
        })
        .collect()
}

/// The twelve-day AAA series: primary entry on day 3, fallback exit on day 7.
pub fn twelve_day_series() -> Vec<Observation> {
    let mut deltas = vec![0.1; 12];
    let mut sentiments = vec![0.0; 12];
    deltas[2] = 2.0;
    sentiments[2] = 0.5;
    deltas[6] = -1.3;
    chained_series("AAA", &deltas, &sentiments)
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// CSV text in the adapter's `date,open,close,sentiment_score` layout.
pub fn series_csv(observations: &[Observation]) -> String {
    let mut out = String::from("date,open,close,sentiment_score\n");
    for o in observations {
        out.push_str(&format!(
            "{},{},{},{}\n",
            o.date, o.open, o.close, o.sentiment_score
        ));
    }
    out
}

/// `ExitCode` has no `PartialEq`; compare through `Debug`.
pub fn assert_exit(code: ExitCode, expected: u8) {
    assert_eq!(
        format!("{code:?}"),
        format!("{:?}", ExitCode::from(expected)),
        "unexpected exit code"
    );
}
