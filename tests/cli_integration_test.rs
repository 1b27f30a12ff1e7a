//! CLI integration tests: config resolution helpers and each subcommand run
//! against INI files and CSV data written to temporary directories.

mod common;

use clap::Parser;
use common::*;
use sentitrader::adapters::file_config_adapter::FileConfigAdapter;
use sentitrader::cli::{self, Cli};
use sentitrader::domain::error::SentiError;
use sentitrader::domain::sentiment::SentimentMode;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Data directory holding AAA (the twelve-day series) and BBB.
fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("AAA.csv"), series_csv(&twelve_day_series())).unwrap();
    let bbb = chained_series("BBB", &[0.5, 3.0, -0.2, -4.0], &[0.3, 0.6, 0.0, -0.5]);
    fs::write(dir.path().join("BBB.csv"), series_csv(&bbb)).unwrap();
    dir
}

fn ini_for(data: &Path, extra: &str) -> String {
    format!(
        "[engine]\nwindow_width = 10\n\n[data]\npath = {}\n{}\n",
        data.display(),
        extra
    )
}

fn run_cli(args: &[&str]) -> std::process::ExitCode {
    let mut argv = vec!["sentitrader"];
    argv.extend_from_slice(args);
    cli::run(Cli::try_parse_from(argv).unwrap())
}

mod resolution {
    use super::*;

    #[test]
    fn symbol_override_beats_config() {
        let data = data_dir();
        let config =
            FileConfigAdapter::from_string(&ini_for(data.path(), "symbols = AAA")).unwrap();
        let port = cli::data_adapter(&config).unwrap();
        assert_eq!(
            cli::resolve_symbols(Some("bbb"), &config, &port).unwrap(),
            vec!["BBB"]
        );
        assert_eq!(cli::resolve_symbols(None, &config, &port).unwrap(), vec!["AAA"]);
    }

    #[test]
    fn symbols_default_to_data_directory() {
        let data = data_dir();
        let config = FileConfigAdapter::from_string(&ini_for(data.path(), "")).unwrap();
        let port = cli::data_adapter(&config).unwrap();
        assert_eq!(
            cli::resolve_symbols(None, &config, &port).unwrap(),
            vec!["AAA", "BBB"]
        );
    }

    #[test]
    fn duplicate_symbols_are_config_errors() {
        let data = data_dir();
        let config =
            FileConfigAdapter::from_string(&ini_for(data.path(), "symbols = AAA,aaa")).unwrap();
        let port = cli::data_adapter(&config).unwrap();
        assert!(matches!(
            cli::resolve_symbols(None, &config, &port),
            Err(SentiError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn missing_data_path() {
        let config = FileConfigAdapter::from_string("[engine]\n").unwrap();
        assert!(matches!(
            cli::data_adapter(&config),
            Err(SentiError::ConfigMissing { ref key, .. }) if key == "path"
        ));
    }

    #[test]
    fn mode_resolution() {
        let config =
            FileConfigAdapter::from_string("[sentiment]\nmode = random\nseed = 9\n").unwrap();
        assert_eq!(
            cli::resolve_mode(None, &config).unwrap(),
            SentimentMode::Random { seed: 9 }
        );
        assert_eq!(
            cli::resolve_mode(Some("negative"), &config).unwrap(),
            SentimentMode::Negative
        );

        let empty = FileConfigAdapter::from_string("[engine]\n").unwrap();
        assert_eq!(cli::resolve_mode(None, &empty).unwrap(), SentimentMode::Observed);
        assert!(cli::resolve_mode(Some("bullish"), &empty).is_err());

        let bad_seed = FileConfigAdapter::from_string("[sentiment]\nseed = abc\n").unwrap();
        assert!(matches!(
            cli::resolve_mode(None, &bad_seed),
            Err(SentiError::ConfigInvalid { ref key, .. }) if key == "seed"
        ));

        let negative_seed = FileConfigAdapter::from_string("[sentiment]\nseed = -1\n").unwrap();
        assert!(matches!(
            cli::resolve_mode(None, &negative_seed),
            Err(SentiError::ConfigInvalid { ref key, .. }) if key == "seed"
        ));
    }
}

mod commands {
    use super::*;

    #[test]
    fn backtest_writes_reports() {
        let data = data_dir();
        let ini = write_temp_ini(&ini_for(data.path(), "symbols = AAA, BBB"));
        let out = TempDir::new().unwrap();
        let code = run_cli(&[
            "backtest",
            "--config",
            ini.path().to_str().unwrap(),
            "--output",
            out.path().to_str().unwrap(),
            "--explain",
        ]);
        assert_exit(code, 0);

        for file in ["AAA_trades.csv", "BBB_trades.csv", "AAA_tiers.csv", "BBB_tiers.csv"] {
            assert!(out.path().join(file).exists(), "missing {file}");
        }
        let trades = fs::read_to_string(out.path().join("AAA_trades.csv")).unwrap();
        assert!(trades.starts_with("symbol,entry_date,exit_date,"));
    }

    #[test]
    fn backtest_reports_position_left_open() {
        let data = data_dir();
        let mut deltas = vec![0.1; 8];
        let mut sentiments = vec![0.0; 8];
        deltas[2] = 2.0;
        sentiments[2] = 0.5;
        let open = chained_series("OPEN", &deltas, &sentiments);
        fs::write(data.path().join("OPEN.csv"), series_csv(&open)).unwrap();

        let ini = write_temp_ini(&ini_for(data.path(), "symbols = OPEN"));
        let out = TempDir::new().unwrap();
        let code = run_cli(&[
            "backtest",
            "--config",
            ini.path().to_str().unwrap(),
            "--output",
            out.path().to_str().unwrap(),
        ]);
        assert_exit(code, 0);
        let trades = fs::read_to_string(out.path().join("OPEN_trades.csv")).unwrap();
        assert_eq!(trades.lines().count(), 1);
    }

    #[test]
    fn backtest_with_bad_mode_is_config_error() {
        let data = data_dir();
        let ini = write_temp_ini(&ini_for(data.path(), ""));
        let code = run_cli(&[
            "backtest",
            "--config",
            ini.path().to_str().unwrap(),
            "--mode",
            "bullish",
        ]);
        assert_exit(code, 2);
    }

    #[test]
    fn backtest_with_invalid_engine_config() {
        let data = data_dir();
        let ini = write_temp_ini(&format!(
            "[engine]\nwindow_width = 0\n\n[data]\npath = {}\n",
            data.path().display()
        ));
        let code = run_cli(&["backtest", "--config", ini.path().to_str().unwrap()]);
        assert_exit(code, 2);
    }

    #[test]
    fn backtest_with_malformed_series_exits_four() {
        let data = data_dir();
        fs::write(
            data.path().join("BAD.csv"),
            "date,open,close,sentiment_score\n2024-01-02,1,2,0\n2024-01-01,2,3,0\n",
        )
        .unwrap();
        let ini = write_temp_ini(&ini_for(data.path(), "symbols = BAD"));
        let code = run_cli(&["backtest", "--config", ini.path().to_str().unwrap()]);
        assert_exit(code, 4);
    }

    #[test]
    fn backtest_with_unparsable_csv_exits_three() {
        let data = data_dir();
        fs::write(
            data.path().join("BAD.csv"),
            "date,open,close,sentiment_score\n2024-01-02,1,x,0\n",
        )
        .unwrap();
        let ini = write_temp_ini(&ini_for(data.path(), "symbols = BAD"));
        let code = run_cli(&["backtest", "--config", ini.path().to_str().unwrap()]);
        assert_exit(code, 3);
    }

    #[test]
    fn backtest_with_no_loadable_symbol_exits_three() {
        let data = data_dir();
        let ini = write_temp_ini(&ini_for(data.path(), "symbols = ZZZ"));
        let code = run_cli(&["backtest", "--config", ini.path().to_str().unwrap()]);
        assert_exit(code, 3);
    }

    #[test]
    fn missing_config_file_exits_two() {
        let code = run_cli(&["validate", "--config", "/nonexistent/sentitrader.ini"]);
        assert_exit(code, 2);
    }

    #[test]
    fn scan_writes_all_rows_when_asked() {
        let data = data_dir();
        let ini = write_temp_ini(&ini_for(data.path(), ""));
        let out = TempDir::new().unwrap();
        let code = run_cli(&[
            "scan",
            "--config",
            ini.path().to_str().unwrap(),
            "--symbol",
            "BBB",
            "--output",
            out.path().to_str().unwrap(),
            "--all",
        ]);
        assert_exit(code, 0);
        let scan = fs::read_to_string(out.path().join("BBB_scan.csv")).unwrap();
        assert!(scan.starts_with("symbol,entry_date,exit_date,entry_price,exit_price,quantity,"));
    }

    #[test]
    fn compare_writes_three_modes() {
        let data = data_dir();
        let ini = write_temp_ini(&ini_for(data.path(), "symbols = AAA\n\n[sentiment]\nseed = 3"));
        let out = TempDir::new().unwrap();
        let code = run_cli(&[
            "compare",
            "--config",
            ini.path().to_str().unwrap(),
            "--output",
            out.path().to_str().unwrap(),
        ]);
        assert_exit(code, 0);

        let summary = fs::read_to_string(out.path().join("mode_summary.csv")).unwrap();
        let modes: Vec<&str> = summary
            .lines()
            .skip(1)
            .map(|l| l.split(',').next().unwrap())
            .collect();
        assert_eq!(modes, vec!["positive", "random", "negative"]);
    }

    #[test]
    fn validate_accepts_full_config() {
        let data = data_dir();
        let ini = write_temp_ini(&format!(
            "[engine]\nwindow_width = 5\nstrength_gate = all\nclose_open_at_end = true\n\n\
             [scan]\nvolatility_exit_threshold = 0.03\n\n\
             [data]\npath = {}\nsymbols = AAA,BBB\n\n\
             [sentiment]\nmode = positive\n",
            data.path().display()
        ));
        assert_exit(run_cli(&["validate", "--config", ini.path().to_str().unwrap()]), 0);
    }

    #[test]
    fn validate_rejects_unparsable_values() {
        for ini in [
            "[engine]\nwindow_width = ten\n",
            "[engine]\nclose_open_at_end = maybe\n",
            "[scan]\nmomentum_sell = -0.01x\n",
            "[sentiment]\nseed = abc\n",
            "[sentiment]\nmode = bullish\n",
        ] {
            let file = write_temp_ini(ini);
            assert_exit(run_cli(&["validate", "--config", file.path().to_str().unwrap()]), 2);
        }
    }

    #[test]
    fn validate_rejects_inverted_scan_thresholds() {
        let ini = write_temp_ini("[scan]\nmomentum_buy = -0.5\nmomentum_sell = 0.5\n");
        assert_exit(run_cli(&["validate", "--config", ini.path().to_str().unwrap()]), 2);
    }

    #[test]
    fn list_symbols_succeeds() {
        let data = data_dir();
        let ini = write_temp_ini(&ini_for(data.path(), ""));
        assert_exit(run_cli(&["list-symbols", "--config", ini.path().to_str().unwrap()]), 0);
    }
}
