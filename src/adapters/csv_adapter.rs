//! CSV observation adapter.
//!
//! One file per symbol, `<dir>/<SYMBOL>.csv`, with columns `date`, `open`,
//! `close` and either `sentiment_score` or `headline`. A bars file with
//! neither column takes its sentiment from `<dir>/<SYMBOL>_news.csv`
//! (`published_at`, `sentiment` label) summed over a window around each bar.
//! Headers are matched after [`sanitize_column`], so `Sentiment Score` works
//! too. Rows are kept in file order; ordering problems surface when the
//! engine validates the series.

use crate::domain::error::SentiError;
use crate::domain::observation::Observation;
use crate::domain::sentiment::{
    aggregate_news, score_headline, NewsItem, NewsLabel, NEWS_WINDOW_DAYS,
};
use crate::ports::data_port::ObservationPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Trim, lower-case, and replace every non-alphanumeric character with `_`.
pub fn sanitize_column(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

enum SentimentColumn {
    Score(usize),
    Headline(usize),
    News,
}

struct Columns {
    date: usize,
    open: usize,
    close: usize,
    sentiment: SentimentColumn,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }

    fn news_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}{NEWS_SUFFIX}.csv"))
    }
}

const NEWS_SUFFIX: &str = "_news";

fn data_error(path: &Path, reason: impl std::fmt::Display) -> SentiError {
    SentiError::Data {
        reason: format!("{}: {}", path.display(), reason),
    }
}

fn locate_columns(
    path: &Path,
    headers: &csv::StringRecord,
    has_news: bool,
) -> Result<Columns, SentiError> {
    let names: Vec<String> = headers.iter().map(sanitize_column).collect();
    let find = |name: &str| names.iter().position(|h| h == name);
    let require = |name: &str| {
        find(name).ok_or_else(|| data_error(path, format!("missing column '{name}'")))
    };

    let sentiment = match (find("sentiment_score"), find("headline")) {
        (Some(i), _) => SentimentColumn::Score(i),
        (None, Some(i)) => SentimentColumn::Headline(i),
        (None, None) if has_news => SentimentColumn::News,
        (None, None) => {
            return Err(data_error(
                path,
                "missing column 'sentiment_score' (or 'headline', or a news file)",
            ));
        }
    };

    Ok(Columns {
        date: require("date")?,
        open: require("open")?,
        close: require("close")?,
        sentiment,
    })
}

fn field<'r>(
    path: &Path,
    line: usize,
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<&'r str, SentiError> {
    record
        .get(index)
        .ok_or_else(|| data_error(path, format!("line {line}: missing {name} value")))
}

fn number(path: &Path, line: usize, raw: &str, name: &str) -> Result<f64, SentiError> {
    raw.parse()
        .map_err(|e| data_error(path, format!("line {line}: invalid {name} '{raw}': {e}")))
}

/// Labelled news rows. Timestamps keep only their date part.
fn read_news(path: &Path, symbol: &str) -> Result<Vec<NewsItem>, SentiError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| data_error(path, e))?;
    let names: Vec<String> = rdr
        .headers()
        .map_err(|e| data_error(path, format!("CSV header error: {e}")))?
        .iter()
        .map(sanitize_column)
        .collect();
    let find = |candidates: &[&str]| {
        names
            .iter()
            .position(|h| candidates.contains(&h.as_str()))
            .ok_or_else(|| data_error(path, format!("missing column '{}'", candidates[0])))
    };
    let published_col = find(&["published_at", "date"])?;
    let label_col = find(&["sentiment", "label"])?;

    let mut news = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let line = i + 2;
        let record =
            result.map_err(|e| data_error(path, format!("line {line}: CSV parse error: {e}")))?;

        let raw = field(path, line, &record, published_col, "published_at")?;
        let day = raw.get(..10).unwrap_or(raw);
        let published = NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| {
            data_error(path, format!("line {line}: invalid published_at '{raw}': {e}"))
        })?;
        let label: NewsLabel = field(path, line, &record, label_col, "sentiment")?
            .parse()
            .map_err(|reason: String| data_error(path, format!("line {line}: {reason}")))?;

        news.push(NewsItem {
            symbol: symbol.to_string(),
            published,
            label,
        });
    }
    Ok(news)
}

impl ObservationPort for CsvAdapter {
    fn fetch_observations(&self, symbol: &str) -> Result<Vec<Observation>, SentiError> {
        let path = self.csv_path(symbol);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SentiError::NoData {
                    symbol: symbol.to_string(),
                });
            }
            Err(e) => return Err(SentiError::Io(e)),
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| data_error(&path, format!("CSV header error: {e}")))?
            .clone();
        let news_path = self.news_path(symbol);
        let cols = locate_columns(&path, &headers, news_path.is_file())?;
        let news = match cols.sentiment {
            SentimentColumn::News => read_news(&news_path, symbol)?,
            _ => Vec::new(),
        };

        let mut observations = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            // header is line 1
            let line = i + 2;
            let record =
                result.map_err(|e| data_error(&path, format!("line {line}: CSV parse error: {e}")))?;

            let date_raw = field(&path, line, &record, cols.date, "date")?;
            let date = NaiveDate::parse_from_str(date_raw, "%Y-%m-%d").map_err(|e| {
                data_error(&path, format!("line {line}: invalid date '{date_raw}': {e}"))
            })?;
            let open = number(&path, line, field(&path, line, &record, cols.open, "open")?, "open")?;
            let close =
                number(&path, line, field(&path, line, &record, cols.close, "close")?, "close")?;
            let sentiment = match cols.sentiment {
                SentimentColumn::Score(idx) => number(
                    &path,
                    line,
                    field(&path, line, &record, idx, "sentiment_score")?,
                    "sentiment_score",
                )?,
                SentimentColumn::Headline(idx) => {
                    score_headline(record.get(idx).unwrap_or_default())
                }
                SentimentColumn::News => aggregate_news(symbol, date, &news, NEWS_WINDOW_DAYS),
            };

            observations.push(Observation::new(symbol, date, open, close, sentiment));
        }

        tracing::debug!(symbol, rows = observations.len(), path = %path.display(), "read CSV");
        Ok(observations)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SentiError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SentiError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    let stem = stem.to_string_lossy();
                    if !stem.ends_with(NEWS_SUFFIX) {
                        symbols.push(stem.into_owned());
                    }
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
