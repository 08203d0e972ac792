//! TradeLab CLI: run, compare, and list strategies.
//!
//! Commands:
//! - `run`: backtest one strategy (or a composite) from a TOML config or flags
//! - `compare`: backtest several strategies on the same series, side by side
//! - `strategies`: list registered strategy ids and their parameter schemas
//!
//! Exit codes: 2 invalid input, 3 invalid configuration, 4 invalid
//! parameter, 5 unknown strategy, 6 data unavailable, 1 anything else.

mod obs;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use tradelab_core::{BacktestError, ErrorKind, PriceSeries, StrategyRegistry};
use tradelab_runner::{
    compare_strategies, data_provider, load_series, run_from_config, save_report, summary_rows,
    BacktestConfig, BacktestReport, ConfigError, DataConfig, RunError, StrategySpec,
};

#[derive(Parser)]
#[command(name = "tradelab", about = "TradeLab CLI: strategy backtesting engine")]
struct Cli {
    /// Log level when TRADELAB_LOG is unset (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format: text or json.
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

/// Where bars come from when no config file is given.
#[derive(Args, Clone)]
struct DataArgs {
    /// Directory of <SYMBOL>.csv files.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Use a seeded synthetic random walk instead of CSV files.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Seed for --synthetic.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Start date (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    end: Option<NaiveDate>,

    /// Initial capital.
    #[arg(long, default_value_t = 100_000.0)]
    capital: f64,

    /// Flat commission rate per trade side.
    #[arg(long, default_value_t = 0.0003)]
    commission: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest a strategy from a TOML config file or from flags.
    Run {
        /// Path to a TOML config file. Overrides every other run flag.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Symbol to backtest (required without --config).
        #[arg(long)]
        symbol: Option<String>,

        /// Strategy id (see `tradelab strategies`).
        #[arg(long)]
        strategy: Option<String>,

        /// Strategy parameter, repeatable: --param short_window=5
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, f64)>,

        #[command(flatten)]
        data: DataArgs,

        /// Write <run_id>.json and <run_id>_trades.csv here.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the full report as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Backtest several strategies (default parameters) on one series.
    Compare {
        #[arg(long)]
        symbol: String,

        /// Strategy ids, comma separated or repeated.
        #[arg(long = "strategy", value_delimiter = ',', required = true)]
        strategies: Vec<String>,

        #[command(flatten)]
        data: DataArgs,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List registered strategies and their parameters.
    Strategies {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = obs::init_tracing(&cli.log_level, &cli.log_format) {
        eprintln!("Error: {e}");
        return ExitCode::from(2);
    }

    let outcome = match cli.command {
        Commands::Run {
            config,
            symbol,
            strategy,
            params,
            data,
            output_dir,
            json,
        } => run_cmd(config, symbol, strategy, params, data, output_dir, json),
        Commands::Compare {
            symbol,
            strategies,
            data,
            json,
        } => compare_cmd(symbol, strategies, data, json),
        Commands::Strategies { json } => strategies_cmd(json),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

// ─── Argument parsing ───────────────────────────────────────────────

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn parse_param(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("bad value for '{key}': {e}"))?;
    Ok((key.trim().to_string(), value))
}

// ─── Exit codes ─────────────────────────────────────────────────────

fn kind_of(err: &anyhow::Error) -> Option<ErrorKind> {
    if let Some(e) = err.downcast_ref::<RunError>() {
        return Some(e.kind());
    }
    if let Some(e) = err.downcast_ref::<BacktestError>() {
        return Some(e.kind());
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return Some(ErrorKind::InvalidConfiguration);
    }
    None
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match kind_of(err) {
        Some(ErrorKind::InvalidInput) => 2,
        Some(ErrorKind::InvalidConfiguration) => 3,
        Some(ErrorKind::InvalidParameter) => 4,
        Some(ErrorKind::UnknownStrategy) => 5,
        Some(ErrorKind::DataUnavailable) => 6,
        Some(ErrorKind::Internal) | None => 1,
    }
}

// ─── Commands ───────────────────────────────────────────────────────

fn config_from_flags(
    symbol: &str,
    strategy: StrategySpec,
    data: &DataArgs,
) -> BacktestConfig {
    let mut config = BacktestConfig::for_strategy(symbol, strategy);
    config.start = data.start;
    config.end = data.end;
    config.initial_capital = data.capital;
    config.commission_rate = data.commission;
    config.data = if data.synthetic {
        DataConfig::Synthetic { seed: data.seed }
    } else {
        DataConfig::Csv {
            dir: data.data_dir.clone(),
        }
    };
    config
}

fn run_cmd(
    config_path: Option<PathBuf>,
    symbol: Option<String>,
    strategy: Option<String>,
    params: Vec<(String, f64)>,
    data: DataArgs,
    output_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let config = match config_path {
        Some(path) => BacktestConfig::from_file(&path)?,
        None => {
            let symbol = symbol.ok_or_else(|| {
                BacktestError::InvalidConfiguration("--symbol is required without --config".into())
            })?;
            let id = strategy.ok_or_else(|| {
                BacktestError::InvalidConfiguration(
                    "--strategy is required without --config".into(),
                )
            })?;
            let spec = StrategySpec {
                id,
                params: params.into_iter().collect::<BTreeMap<_, _>>(),
            };
            let config = config_from_flags(&symbol, spec, &data);
            config.validate()?;
            config
        }
    };

    let registry = StrategyRegistry::new();
    let report = run_from_config(&config, &registry)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        );
    } else {
        print_summary(&report);
    }

    if let Some(dir) = output_dir {
        let path = save_report(&report, &dir)?;
        println!("Report saved to: {}", path.display());
    }
    Ok(())
}

fn compare_cmd(symbol: String, strategies: Vec<String>, data: DataArgs, json: bool) -> Result<()> {
    let specs: Vec<StrategySpec> = strategies.into_iter().map(StrategySpec::new).collect();
    // Only the data and simulator settings of this config matter here.
    let config = config_from_flags(&symbol, StrategySpec::new("compare"), &data);
    config.validate()?;

    let provider = data_provider(&config);
    let series: PriceSeries = load_series(provider.as_ref(), &symbol, config.start, config.end)?;

    let registry = StrategyRegistry::new();
    let results = compare_strategies(&registry, &series, &specs, &config.simulator_config())?;
    let rows = summary_rows(&results);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&rows).context("failed to serialize comparison")?
        );
        return Ok(());
    }

    println!("Comparison on {symbol} ({} bars)", series.len());
    println!(
        "{:<22} {:>10} {:>10} {:>8} {:>8} {:>8} {:>7}",
        "strategy", "total", "annual", "sharpe", "max_dd", "win", "trades"
    );
    for row in rows {
        println!(
            "{:<22} {:>9.2}% {:>9.2}% {:>8.2} {:>7.2}% {:>7.1}% {:>7}",
            row.key,
            row.total_return * 100.0,
            row.annual_return * 100.0,
            row.sharpe_ratio,
            row.max_drawdown * 100.0,
            row.win_rate * 100.0,
            row.trades_count,
        );
    }
    Ok(())
}

fn strategies_cmd(json: bool) -> Result<()> {
    let registry = StrategyRegistry::new();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(registry.list())
                .context("failed to serialize strategy list")?
        );
        return Ok(());
    }

    for info in registry.list() {
        println!("{:<20} {}", info.id, info.description);
        for p in info.params {
            println!(
                "    {:<18} {:?} [{}, {}] default {}",
                p.name, p.kind, p.min, p.max, p.default
            );
        }
    }
    Ok(())
}

fn print_summary(report: &BacktestReport) {
    let m = &report.metrics;
    println!("=== Backtest: {} / {} ===", report.symbol, report.strategy);
    println!("Run ID:          {}", report.run_id);
    if let (Some(first), Some(last)) = (report.dates.first(), report.dates.last()) {
        println!("Period:          {first} to {last} ({} bars)", report.dates.len());
    }
    if report.signal_status.is_degraded() {
        println!("Signal status:   {:?}", report.signal_status);
    }
    println!("Initial capital: {:.2}", report.initial_capital);
    println!("Final equity:    {:.2}", report.final_equity());
    println!("Total return:    {:.2}%", m.total_return * 100.0);
    println!("Annual return:   {:.2}%", m.annual_return * 100.0);
    println!("Volatility:      {:.2}%", m.volatility * 100.0);
    println!("Sharpe:          {:.3}", m.sharpe_ratio);
    println!("Sortino:         {:.3}", report.risk.sortino_ratio);
    println!("Max drawdown:    {:.2}%", m.max_drawdown * 100.0);
    println!("VaR (95%):       {:.2}%", report.risk.var_95 * 100.0);
    println!("Win rate:        {:.1}%", m.win_rate * 100.0);
    println!("Profit/loss:     {:.2}", m.profit_loss_ratio);
    println!("Round trips:     {}", m.trades_count);
    for (key, sub) in &report.constituents {
        println!(
            "  - {key:<20} return {:>7.2}%  trades {}",
            sub.metrics.total_return * 100.0,
            sub.metrics.trades_count
        );
    }
}
