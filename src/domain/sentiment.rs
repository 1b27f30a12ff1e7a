//! Sentiment inputs.
//!
//! Nothing here is consulted by the engines. These helpers produce or
//! replace the `sentiment_score` of observations before a run: a keyword
//! headline scorer, a labelled-news aggregator, and the synthetic sentiment
//! modes used to stress the strategy.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::str::FromStr;

use super::observation::Observation;

const KEYWORD_WEIGHT: f64 = 0.2;

/// Days either side of a bar whose labelled news counts toward its score.
pub const NEWS_WINDOW_DAYS: i64 = 1;

const POSITIVE_KEYWORDS: &[&str] = &[
    "beats",
    "record revenue",
    "record profit",
    "strong earnings",
    "new product",
    "growth",
    "surge",
    "upgrade",
    "launch",
    "partnership",
    "boost",
    "strong demand",
    "revenue jump",
    "expansion",
    "acquisition",
    "positive outlook",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "downgrade",
    "ceo steps down",
    "missed estimates",
    "lawsuit",
    "slump",
    "drop",
    "cut jobs",
    "cut forecast",
    "probe",
    "investigation",
    "recall",
    "problem",
    "may not boost",
    "concern",
    "struggle",
    "negative outlook",
    "regulatory risk",
];

/// Score free text by keyword matches, clamped to `[-1, 1]`.
///
/// Each positive phrase present adds 0.2 and each negative phrase subtracts
/// 0.2. Phrases match case-insensitively on whole words only, and each
/// phrase counts at most once.
pub fn score_headline(text: &str) -> f64 {
    let lowered = text.to_lowercase();
    let hits = |keywords: &[&str]| {
        keywords
            .iter()
            .filter(|k| contains_phrase(&lowered, k))
            .count() as f64
    };
    let score = KEYWORD_WEIGHT * hits(POSITIVE_KEYWORDS) - KEYWORD_WEIGHT * hits(NEGATIVE_KEYWORDS);
    score.clamp(-1.0, 1.0)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Literal match of `phrase` with a word boundary on both ends. Separators
/// inside the phrase must match exactly, so "ceo-steps down" does not
/// contain "ceo steps down".
fn contains_phrase(text: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    text.match_indices(phrase).any(|(start, _)| {
        let end = start + phrase.len();
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsLabel {
    Positive,
    Negative,
    Neutral,
}

impl NewsLabel {
    pub fn weight(&self) -> f64 {
        match self {
            NewsLabel::Positive => 1.0,
            NewsLabel::Negative => -1.0,
            NewsLabel::Neutral => 0.0,
        }
    }
}

impl FromStr for NewsLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(NewsLabel::Positive),
            "negative" => Ok(NewsLabel::Negative),
            "neutral" | "" => Ok(NewsLabel::Neutral),
            other => Err(format!("unknown news label '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub symbol: String,
    pub published: NaiveDate,
    pub label: NewsLabel,
}

/// Sum of label weights for `symbol` published within `window_days` of `date`.
pub fn aggregate_news(symbol: &str, date: NaiveDate, news: &[NewsItem], window_days: i64) -> f64 {
    let from = date - Duration::days(window_days);
    let to = date + Duration::days(window_days);
    news.iter()
        .filter(|n| n.symbol == symbol && n.published >= from && n.published <= to)
        .map(|n| n.label.weight())
        .sum()
}

/// How observation sentiment is produced for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SentimentMode {
    /// Keep the scores supplied with the data.
    #[default]
    Observed,
    Positive,
    Negative,
    /// Uniform draw from {-1, 0, 1}, reproducible for a given seed.
    Random { seed: u64 },
}

impl SentimentMode {
    pub fn name(&self) -> &'static str {
        match self {
            SentimentMode::Observed => "observed",
            SentimentMode::Positive => "positive",
            SentimentMode::Negative => "negative",
            SentimentMode::Random { .. } => "random",
        }
    }

    pub fn parse(name: &str, seed: u64) -> Result<Self, String> {
        match name.trim().to_lowercase().as_str() {
            "observed" => Ok(SentimentMode::Observed),
            "positive" => Ok(SentimentMode::Positive),
            "negative" => Ok(SentimentMode::Negative),
            "random" => Ok(SentimentMode::Random { seed }),
            other => Err(format!(
                "unknown sentiment mode '{other}' (expected observed, positive, negative or random)"
            )),
        }
    }

    /// Return a copy of the series with sentiment replaced per this mode.
    pub fn apply(&self, observations: &[Observation]) -> Vec<Observation> {
        match *self {
            SentimentMode::Observed => observations.to_vec(),
            SentimentMode::Positive => observations.iter().map(|o| o.with_sentiment(1.0)).collect(),
            SentimentMode::Negative => {
                observations.iter().map(|o| o.with_sentiment(-1.0)).collect()
            }
            SentimentMode::Random { seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                observations
                    .iter()
                    .map(|o| o.with_sentiment(rng.gen_range(-1i32..=1) as f64))
                    .collect()
            }
        }
    }
}

impl fmt::Display for SentimentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
