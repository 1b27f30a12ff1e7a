//! CSV report writer.
//!
//! Files land in the output directory as `<SYMBOL>_trades.csv`,
//! `<SYMBOL>_scan.csv`, `<SYMBOL>_tiers.csv` and `mode_summary.csv`.

use crate::adapters::csv_adapter::sanitize_column;
use crate::domain::engine::BacktestRun;
use crate::domain::error::SentiError;
use crate::domain::exit_scan::ScanReport;
use crate::domain::metrics::{ModeSummary, TierStats};
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::PathBuf;

const TRADE_COLUMNS: &[&str] = &[
    "Symbol",
    "Entry Date",
    "Exit Date",
    "Entry Price",
    "Exit Price",
    "PnL",
    "Capital After",
    "Holding Days",
    "Signal Strength",
    "Confidence",
    "Trigger Type",
    "Exit Reason",
];

const SCAN_COLUMNS: &[&str] = &[
    "Symbol",
    "Entry Date",
    "Exit Date",
    "Entry Price",
    "Exit Price",
    "Quantity",
    "Capital",
    "PnL",
    "Holding Days",
    "Momentum Score",
    "Sentiment Score",
    "Exit Trigger",
    "Final Signal",
    "Reason",
];

const SUMMARY_COLUMNS: &[&str] = &["Mode", "Trades", "Total PnL", "Avg Hold"];

const TIER_COLUMNS: &[&str] = &["Trigger Type", "Count", "Total PnL"];

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    fn writer(&self, file_name: &str) -> Result<(csv::Writer<fs::File>, PathBuf), SentiError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(file_name);
        let writer = csv::Writer::from_path(&path).map_err(|e| csv_error(&path, e))?;
        Ok((writer, path))
    }
}

fn csv_error(path: &std::path::Path, e: csv::Error) -> SentiError {
    SentiError::Data {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

fn header(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| sanitize_column(c)).collect()
}

fn finish(mut writer: csv::Writer<fs::File>, path: PathBuf) -> Result<String, SentiError> {
    writer.flush()?;
    tracing::info!(path = %path.display(), "wrote report");
    Ok(path.display().to_string())
}

impl ReportPort for CsvReportAdapter {
    fn write_trades(&self, run: &BacktestRun) -> Result<String, SentiError> {
        let (mut w, path) = self.writer(&format!("{}_trades.csv", run.symbol))?;
        w.write_record(header(TRADE_COLUMNS))
            .map_err(|e| csv_error(&path, e))?;
        for t in &run.trades {
            w.write_record([
                t.symbol.clone(),
                t.entry_date.to_string(),
                t.exit_date.to_string(),
                t.entry_price.to_string(),
                t.exit_price.to_string(),
                t.pnl.to_string(),
                t.capital_after.to_string(),
                t.holding_days.to_string(),
                t.signal_strength.to_string(),
                t.confidence.to_string(),
                t.trigger_type.to_string(),
                t.exit_reason.to_string(),
            ])
            .map_err(|e| csv_error(&path, e))?;
        }
        finish(w, path)
    }

    fn write_scan(
        &self,
        symbol: &str,
        report: &ScanReport,
        include_held: bool,
    ) -> Result<String, SentiError> {
        let (mut w, path) = self.writer(&format!("{symbol}_scan.csv"))?;
        w.write_record(header(SCAN_COLUMNS))
            .map_err(|e| csv_error(&path, e))?;
        let rows = if include_held {
            &report.evaluated
        } else {
            &report.trades
        };
        for t in rows {
            w.write_record([
                t.symbol.clone(),
                t.entry_date.to_string(),
                t.exit_date.to_string(),
                t.entry_price.to_string(),
                t.exit_price.to_string(),
                t.quantity.to_string(),
                t.capital.to_string(),
                t.pnl.to_string(),
                t.holding_days.to_string(),
                t.momentum_score.to_string(),
                t.sentiment_score.to_string(),
                t.exit_trigger.to_string(),
                t.final_signal.to_string(),
                t.reason().to_string(),
            ])
            .map_err(|e| csv_error(&path, e))?;
        }
        finish(w, path)
    }

    fn write_summary(&self, rows: &[ModeSummary]) -> Result<String, SentiError> {
        let (mut w, path) = self.writer("mode_summary.csv")?;
        w.write_record(header(SUMMARY_COLUMNS))
            .map_err(|e| csv_error(&path, e))?;
        for row in rows {
            w.write_record([
                row.mode.clone(),
                row.trades.to_string(),
                format!("{:.2}", row.total_pnl),
                format!("{:.2}", row.avg_hold),
            ])
            .map_err(|e| csv_error(&path, e))?;
        }
        finish(w, path)
    }

    fn write_tiers(&self, symbol: &str, tiers: &[TierStats]) -> Result<String, SentiError> {
        let (mut w, path) = self.writer(&format!("{symbol}_tiers.csv"))?;
        w.write_record(header(TIER_COLUMNS))
            .map_err(|e| csv_error(&path, e))?;
        for t in tiers {
            w.write_record([
                t.tier.to_string(),
                t.trades.to_string(),
                t.total_pnl.to_string(),
            ])
            .map_err(|e| csv_error(&path, e))?;
        }
        finish(w, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::{EngineConfig, ScanConfig};
    use crate::domain::engine::run_with_thresholds;
    use crate::domain::exit_scan::run_exit_scan;
    use crate::domain::observation::Observation;
    use crate::domain::thresholds::Thresholds;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn sample_run() -> BacktestRun {
        let series = vec![
            Observation::new("AAA", day(1), 100.0, 102.0, 0.5),
            Observation::new("AAA", day(2), 102.0, 100.5, 0.0),
        ];
        run_with_thresholds(
            &series,
            &[Thresholds::new(0.0, 1.0); 2],
            &EngineConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn writes_trade_file_with_sanitized_header() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvReportAdapter::new(dir.path().join("out"));
        let written = adapter.write_trades(&sample_run()).unwrap();

        let content = fs::read_to_string(&written).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "symbol,entry_date,exit_date,entry_price,exit_price,pnl,capital_after,\
             holding_days,signal_strength,confidence,trigger_type,exit_reason"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("AAA,2024-01-01,2024-01-02,102,100.5,-1.5,"));
        assert!(row.ends_with(",primary,fallback"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn scan_file_respects_include_held() {
        let dir = TempDir::new().unwrap();
        let series = vec![
            Observation::new("AAA", day(1), 100.0, 100.0, 0.0),
            Observation::new("AAA", day(2), 100.0, 105.0, 0.0),
        ];
        let report = run_exit_scan(&series, &ScanConfig::default()).unwrap();
        assert_eq!(report.evaluated.len(), 1);
        assert!(report.trades.is_empty());

        let adapter = CsvReportAdapter::new(dir.path().to_path_buf());
        let only = fs::read_to_string(adapter.write_scan("AAA", &report, false).unwrap()).unwrap();
        assert_eq!(only.lines().count(), 1);
        let all = fs::read_to_string(adapter.write_scan("AAA", &report, true).unwrap()).unwrap();
        assert_eq!(all.lines().count(), 2);
        assert!(all.contains("HOLD"));
        assert!(all.contains("signal suppressed"));
    }

    #[test]
    fn tier_file_lists_every_tier() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvReportAdapter::new(dir.path().to_path_buf());
        let run = sample_run();
        let tiers = TierStats::compute(&run.trades);
        let content = fs::read_to_string(adapter.write_tiers("AAA", &tiers).unwrap()).unwrap();
        assert_eq!(
            content,
            "trigger_type,count,total_pnl\nprimary,1,-1.5\nfallback,0,0\nmomentum,0,0\n"
        );
    }

    #[test]
    fn summary_has_two_decimals() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvReportAdapter::new(dir.path().to_path_buf());
        let rows = vec![ModeSummary {
            mode: "positive".into(),
            trades: 3,
            total_pnl: 12.5,
            avg_hold: 2.0,
        }];
        let content = fs::read_to_string(adapter.write_summary(&rows).unwrap()).unwrap();
        assert_eq!(content, "mode,trades,total_pnl,avg_hold\npositive,3,12.50,2.00\n");
    }
}
