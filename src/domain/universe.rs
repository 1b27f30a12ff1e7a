//! Symbol universe: parse the configured symbol list and load each series.

use crate::domain::error::SentiError;
use crate::domain::observation::Observation;
use crate::ports::data_port::ObservationPort;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

impl From<UniverseError> for SentiError {
    fn from(err: UniverseError) -> Self {
        SentiError::invalid("data", "symbols", err.to_string())
    }
}

/// Split a comma-separated list, trimming and upper-casing each symbol.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedUniverse {
    pub series: Vec<(String, Vec<Observation>)>,
    pub skipped: Vec<String>,
}

/// Fetch every symbol through the port, skipping the ones with no rows.
///
/// Malformed files still abort; only `NoData` and empty series are skipped.
/// Fails with `NoData` when nothing is left.
pub fn load_universe(
    port: &dyn ObservationPort,
    symbols: &[String],
) -> Result<LoadedUniverse, SentiError> {
    let mut series = Vec::new();
    let mut skipped = Vec::new();

    for symbol in symbols {
        match port.fetch_observations(symbol) {
            Ok(observations) if observations.is_empty() => {
                tracing::warn!(symbol = %symbol, "skipping symbol: no rows");
                skipped.push(symbol.clone());
            }
            Ok(observations) => {
                tracing::info!(symbol = %symbol, rows = observations.len(), "loaded series");
                series.push((symbol.clone(), observations));
            }
            Err(SentiError::NoData { .. }) => {
                tracing::warn!(symbol = %symbol, "skipping symbol: no data file");
                skipped.push(symbol.clone());
            }
            Err(e) => return Err(e),
        }
    }

    if series.is_empty() {
        return Err(SentiError::NoData {
            symbol: symbols.join(","),
        });
    }

    Ok(LoadedUniverse { series, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    struct StubPort {
        data: HashMap<String, Vec<Observation>>,
    }

    impl ObservationPort for StubPort {
        fn fetch_observations(&self, symbol: &str) -> Result<Vec<Observation>, SentiError> {
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

    fn stub() -> StubPort {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let mut data = HashMap::new();
        data.insert(
            "AAA".to_string(),
            vec![Observation::new("AAA", date, 10.0, 11.0, 0.0)],
        );
        data.insert("EMPTY".to_string(), vec![]);
        StubPort { data }
    }

    #[test]
    fn parse_basic() {
        assert_eq!(parse_symbols("AAPL,MSFT,TSLA").unwrap(), vec!["AAPL", "MSFT", "TSLA"]);
    }

    #[test]
    fn parse_trims_and_uppercases() {
        assert_eq!(parse_symbols("  aapl , msft ").unwrap(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn parse_empty_token() {
        assert_eq!(parse_symbols("AAPL,,MSFT"), Err(UniverseError::EmptyToken));
    }

    #[test]
    fn parse_duplicate_after_case_fold() {
        assert_eq!(
            parse_symbols("AAPL,msft,aapl"),
            Err(UniverseError::DuplicateSymbol("AAPL".into()))
        );
    }

    #[test]
    fn universe_error_is_config_invalid() {
        let err: SentiError = UniverseError::EmptyToken.into();
        assert!(matches!(err, SentiError::ConfigInvalid { ref section, .. } if section == "data"));
    }

    #[test]
    fn load_skips_missing_and_empty() {
        let symbols = vec!["AAA".to_string(), "EMPTY".to_string(), "ZZZ".to_string()];
        let loaded = load_universe(&stub(), &symbols).unwrap();
        assert_eq!(loaded.series.len(), 1);
        assert_eq!(loaded.series[0].0, "AAA");
        assert_eq!(loaded.skipped, vec!["EMPTY", "ZZZ"]);
    }

    #[test]
    fn load_fails_when_nothing_loads() {
        let symbols = vec!["ZZZ".to_string()];
        assert!(matches!(
            load_universe(&stub(), &symbols),
            Err(SentiError::NoData { .. })
        ));
    }
}
