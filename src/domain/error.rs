//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for sentitrader.
#[derive(Debug, thiserror::Error)]
pub enum SentiError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("malformed observation for {symbol} at index {index} ({date}): {reason}")]
    MalformedObservation {
        symbol: String,
        index: usize,
        date: NaiveDate,
        reason: String,
    },

    #[error("threshold series has {thresholds} points but observation series has {observations}")]
    ThresholdMismatch {
        observations: usize,
        thresholds: usize,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SentiError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SentiError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&SentiError> for std::process::ExitCode {
    fn from(err: &SentiError) -> Self {
        let code: u8 = match err {
            SentiError::Io(_) => 1,
            SentiError::ConfigParse { .. }
            | SentiError::ConfigMissing { .. }
            | SentiError::ConfigInvalid { .. } => 2,
            SentiError::Data { .. } | SentiError::NoData { .. } => 3,
            SentiError::MalformedObservation { .. } | SentiError::ThresholdMismatch { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
