//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config::{EngineConfig, ScanConfig};
use crate::domain::engine::{run_universe, BacktestRun};
use crate::domain::error::SentiError;
use crate::domain::exit_scan::{run_exit_scan, FinalSignal, ScanReport};
use crate::domain::explain::{narrate_skipped, narrate_trade, skipped_signals};
use crate::domain::metrics::{ModeSummary, TierStats, TradeStats};
use crate::domain::observation::Observation;
use crate::domain::sentiment::SentimentMode;
use crate::domain::thresholds::compute_thresholds;
use crate::domain::universe::{load_universe, parse_symbols};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::ObservationPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_SEED: i64 = 42;

#[derive(Parser, Debug)]
#[command(name = "sentitrader", about = "Sentiment and momentum threshold backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the threshold backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated symbols, overriding [data] symbols
        #[arg(long)]
        symbol: Option<String>,
        /// Sentiment mode: observed, positive, negative or random
        #[arg(long)]
        mode: Option<String>,
        /// Directory for CSV trade reports
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print trade narratives and skipped signals
        #[arg(long)]
        explain: bool,
    },
    /// Run the forward exit scanner
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Include HOLD round trips in the output
        #[arg(long)]
        all: bool,
    },
    /// Compare positive, random and negative sentiment modes
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            symbol,
            mode,
            output,
            explain,
        } => run_backtest(
            &config,
            symbol.as_deref(),
            mode.as_deref(),
            output.as_deref(),
            explain,
        ),
        Command::Scan {
            config,
            symbol,
            output,
            all,
        } => run_scan(&config, symbol.as_deref(), output.as_deref(), all),
        Command::Compare {
            config,
            symbol,
            output,
        } => run_compare(&config, symbol.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SentiError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// CSV adapter rooted at `[data] path`.
pub fn data_adapter(config: &dyn ConfigPort) -> Result<CsvAdapter, SentiError> {
    let path = config
        .get_string("data", "path")
        .ok_or_else(|| SentiError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(path.trim())))
}

/// Symbols from the command line, else `[data] symbols`, else every file
/// the data port knows about.
pub fn resolve_symbols(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
    port: &dyn ObservationPort,
) -> Result<Vec<String>, SentiError> {
    if let Some(s) = symbol_override {
        return Ok(parse_symbols(s)?);
    }
    if let Some(s) = config.get_string("data", "symbols") {
        return Ok(parse_symbols(&s)?);
    }

    let listed = port.list_symbols()?;
    if listed.is_empty() {
        return Err(SentiError::ConfigMissing {
            section: "data".into(),
            key: "symbols".into(),
        });
    }
    Ok(listed)
}

pub fn resolve_mode(
    mode_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<SentimentMode, SentiError> {
    let name = mode_override
        .map(str::to_string)
        .or_else(|| config.get_string("sentiment", "mode"))
        .unwrap_or_else(|| "observed".to_string());
    SentimentMode::parse(&name, resolve_seed(config)?)
        .map_err(|reason| SentiError::invalid("sentiment", "mode", reason))
}

fn resolve_seed(config: &dyn ConfigPort) -> Result<u64, SentiError> {
    let seed = config.get_int("sentiment", "seed", DEFAULT_SEED)?;
    u64::try_from(seed)
        .map_err(|_| SentiError::invalid("sentiment", "seed", "seed must not be negative"))
}

fn load_series(
    config: &dyn ConfigPort,
    symbol_override: Option<&str>,
) -> Result<Vec<(String, Vec<Observation>)>, SentiError> {
    let port = data_adapter(config)?;
    let symbols = resolve_symbols(symbol_override, config, &port)?;
    eprintln!(
        "Loading {} symbol(s) from {}",
        symbols.len(),
        port.base_path().display()
    );
    let universe = load_universe(&port, &symbols)?;
    if !universe.skipped.is_empty() {
        eprintln!(
            "Backtesting {} of {} symbols (skipped: {})",
            universe.series.len(),
            symbols.len(),
            universe.skipped.join(", ")
        );
    }
    Ok(universe.series)
}

fn apply_mode(
    series: &[(String, Vec<Observation>)],
    mode: SentimentMode,
) -> Vec<(String, Vec<Observation>)> {
    series
        .iter()
        .map(|(symbol, obs)| (symbol.clone(), mode.apply(obs)))
        .collect()
}

fn run_backtest(
    config_path: &Path,
    symbol_override: Option<&str>,
    mode_override: Option<&str>,
    output: Option<&Path>,
    explain: bool,
) -> Result<(), SentiError> {
    // Stage 1: config
    let config = load_config(config_path)?;
    let engine = EngineConfig::from_port(&config)?;
    let mode = resolve_mode(mode_override, &config)?;

    // Stage 2: data
    let series = apply_mode(&load_series(&config, symbol_override)?, mode);

    // Stage 3: run
    eprintln!(
        "Running backtest: {} symbol(s), window {}, {} sentiment",
        series.len(),
        engine.window_width,
        mode
    );
    let runs = run_universe(&series, &engine)?;

    // Stage 4: console summary
    for (run, (_, observations)) in runs.iter().zip(&series) {
        print_run_summary(run, observations, engine.starting_capital);
        if explain {
            print_explanation(run, observations, &engine);
        }
    }

    // Stage 5: reports
    if let Some(dir) = output {
        let reporter = CsvReportAdapter::new(dir.to_path_buf());
        for run in &runs {
            let path = reporter.write_trades(run)?;
            eprintln!("Trades written to: {path}");
            let path = reporter.write_tiers(&run.symbol, &TierStats::compute(&run.trades))?;
            eprintln!("Tier breakdown written to: {path}");
        }
    }

    Ok(())
}

fn print_run_summary(run: &BacktestRun, observations: &[Observation], starting_capital: f64) {
    let stats = TradeStats::compute(&run.trades, starting_capital);
    let s = &run.summary;

    eprintln!("\n=== {} ===", run.symbol);
    eprintln!("Total Trades:     {}", stats.total_trades);
    eprintln!("Total PnL:        {:.2}", stats.total_pnl);
    eprintln!("Win Rate:         {:.1}%", stats.win_rate * 100.0);
    eprintln!("Avg Holding:      {:.2} days", stats.avg_holding_days);
    eprintln!("Largest Win:      {:.2}", stats.largest_win);
    eprintln!("Largest Loss:     {:.2}", stats.largest_loss);
    eprintln!("Max Drawdown:     -{:.3}%", stats.max_drawdown * 100.0);
    eprintln!("Final Capital:    {:.2}", run.final_capital);
    eprintln!(
        "Signals:          {} buys ({} primary, {} fallback, {} momentum), \
         {} sells ({} reversal, {} fallback, {} momentum)",
        s.total_buys(),
        s.primary_buys,
        s.fallback_buys,
        s.momentum_buys,
        s.total_sells(),
        s.reversal_sells,
        s.fallback_sells,
        s.momentum_sells,
    );
    eprintln!(
        "Suppressed:       {} weak, {} degenerate threshold",
        s.weak_signals, s.degenerate_thresholds
    );

    for tier in TierStats::compute(&run.trades).iter().filter(|t| t.trades > 0) {
        eprintln!(
            "  {:<9} {} trades, {:.2} pnl",
            tier.tier.to_string(),
            tier.trades,
            tier.total_pnl
        );
    }

    if let (Some(open), Some(last)) = (&run.open_position, observations.last()) {
        eprintln!(
            "Open position:    entered {} at {:.2} via {}, unrealized {:.2} at {} (not traded)",
            open.entry_date,
            open.entry_price,
            open.trigger,
            open.unrealized_pnl(last.close),
            last.date
        );
    }
}

fn print_explanation(run: &BacktestRun, observations: &[Observation], engine: &EngineConfig) {
    println!("\n{} trade narratives:", run.symbol);
    if run.trades.is_empty() {
        println!("  no trades executed, capital unchanged");
    }
    for trade in &run.trades {
        println!("  {}", narrate_trade(trade));
    }

    let thresholds = compute_thresholds(observations, engine.window_width);
    let skipped = skipped_signals(observations, &thresholds);
    println!("{} skipped signals: {}", run.symbol, skipped.len());
    for s in &skipped {
        println!("  {}", narrate_skipped(s));
    }
}

fn run_scan(
    config_path: &Path,
    symbol_override: Option<&str>,
    output: Option<&Path>,
    include_held: bool,
) -> Result<(), SentiError> {
    let config = load_config(config_path)?;
    let scan = ScanConfig::from_port(&config)?;
    let mode = resolve_mode(None, &config)?;
    let series = apply_mode(&load_series(&config, symbol_override)?, mode);

    eprintln!(
        "Running exit scan: {} symbol(s), volatility exit {:.2}%",
        series.len(),
        scan.volatility_exit_threshold * 100.0
    );

    let reporter = output.map(|dir| CsvReportAdapter::new(dir.to_path_buf()));
    for (symbol, observations) in &series {
        let report = run_exit_scan(observations, &scan)?;
        print_scan_summary(symbol, &report, include_held);
        if let Some(r) = &reporter {
            let path = r.write_scan(symbol, &report, include_held)?;
            eprintln!("Scan written to: {path}");
        }
    }
    Ok(())
}

fn print_scan_summary(symbol: &str, report: &ScanReport, include_held: bool) {
    let count = |signal: FinalSignal| {
        report
            .trades
            .iter()
            .filter(|t| t.final_signal == signal)
            .count()
    };
    let pnl: f64 = report.trades.iter().map(|t| t.pnl).sum();

    eprintln!("\n=== {symbol} exit scan ===");
    eprintln!("Evaluated:        {}", report.evaluated.len());
    eprintln!(
        "Kept:             {} ({} BUY, {} SELL)",
        report.trades.len(),
        count(FinalSignal::Buy),
        count(FinalSignal::Sell)
    );
    eprintln!("Held:             {}", report.held().count());
    eprintln!("Total PnL:        {pnl:.2}");

    let rows = if include_held {
        &report.evaluated
    } else {
        &report.trades
    };
    for t in rows {
        println!(
            "{} {}: {} | momentum {:.2}% | sentiment {:.2}% | {} exit after {} days | {}",
            t.symbol,
            t.entry_date,
            t.final_signal,
            t.momentum_score * 100.0,
            t.sentiment_score * 100.0,
            t.exit_trigger,
            t.holding_days,
            t.reason()
        );
    }
}

/// Modes compared by `compare`, in report order.
fn comparison_modes(seed: u64) -> [SentimentMode; 3] {
    [
        SentimentMode::Positive,
        SentimentMode::Random { seed },
        SentimentMode::Negative,
    ]
}

fn run_compare(
    config_path: &Path,
    symbol_override: Option<&str>,
    output: Option<&Path>,
) -> Result<(), SentiError> {
    let config = load_config(config_path)?;
    let engine = EngineConfig::from_port(&config)?;
    let seed = resolve_seed(&config)?;
    let base = load_series(&config, symbol_override)?;

    let mut rows = Vec::new();
    for mode in comparison_modes(seed) {
        let runs = run_universe(&apply_mode(&base, mode), &engine)?;
        let trades: Vec<_> = runs.into_iter().flat_map(|r| r.trades).collect();
        tracing::info!(mode = %mode, trades = trades.len(), "mode finished");
        rows.push(ModeSummary::from_trades(mode.name(), &trades));
    }

    println!("{:<10} {:>8} {:>12} {:>10}", "mode", "trades", "total_pnl", "avg_hold");
    for row in &rows {
        println!(
            "{:<10} {:>8} {:>12.2} {:>10.2}",
            row.mode, row.trades, row.total_pnl, row.avg_hold
        );
    }

    if let Some(dir) = output {
        let path = CsvReportAdapter::new(dir.to_path_buf()).write_summary(&rows)?;
        eprintln!("Summary written to: {path}");
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), SentiError> {
    let config = load_config(config_path)?;

    let engine = EngineConfig::from_port(&config)?;
    eprintln!("\n[engine]");
    eprintln!("  window_width:            {}", engine.window_width);
    eprintln!("  min_signal_strength:     {}", engine.min_signal_strength);
    eprintln!("  fallback_buy_ratio:      {}", engine.fallback_buy_ratio);
    eprintln!("  momentum_buy_threshold:  {}", engine.momentum_buy_threshold);
    eprintln!("  momentum_sell_threshold: {}", engine.momentum_sell_threshold);
    eprintln!("  fallback_sell_threshold: {}", engine.fallback_sell_threshold);
    eprintln!("  starting_capital:        {}", engine.starting_capital);
    eprintln!("  close_open_at_end:       {}", engine.close_open_at_end);
    eprintln!("  strength_gate:           {}", engine.strength_gate);

    let scan = ScanConfig::from_port(&config)?;
    eprintln!("\n[scan]");
    eprintln!("  volatility_exit_threshold: {}", scan.volatility_exit_threshold);
    eprintln!("  buy:  momentum > {}, sentiment >= {}", scan.momentum_buy, scan.sentiment_buy);
    eprintln!("  sell: momentum < {}, sentiment <= {}", scan.momentum_sell, scan.sentiment_sell);

    let mode = resolve_mode(None, &config)?;
    eprintln!("\n[sentiment]");
    eprintln!("  mode: {mode}");

    if let Some(symbols) = config.get_string("data", "symbols") {
        let parsed = parse_symbols(&symbols)?;
        eprintln!("\n[data]");
        eprintln!("  symbols: {}", parsed.join(", "));
    }

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_list_symbols(config_path: &Path) -> Result<(), SentiError> {
    let config = load_config(config_path)?;
    let port = data_adapter(&config)?;
    let symbols = port.list_symbols()?;

    if symbols.is_empty() {
        eprintln!("No symbols found in {}", port.base_path().display());
    } else {
        for symbol in &symbols {
            println!("{symbol}");
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}
