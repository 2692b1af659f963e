//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::adapters::json_strategy_adapter::JsonStrategyAdapter;
use crate::domain::backtest::{BacktestRequest, BacktestResult, run_request};
use crate::domain::config_validation::{self, validate_backtest_config};
use crate::domain::error::BacktestError;
use crate::domain::metrics::OpenPositionPolicy;
use crate::domain::rule_compiler;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "stratsim", about = "Rule-based strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Strategy JSON file; defaults to `[strategy] dir`/`id` from the config
        #[arg(short, long)]
        strategy: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        /// Write the report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a strategy definition
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
    },
    /// Show data range for a symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            strategy,
            symbol,
            output,
        } => run_backtest(&config, strategy.as_deref(), symbol.as_deref(), output.as_deref()),
        Command::Validate { strategy } => {
            init_logging(None);
            run_validate(&strategy)
        }
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over `level`, which wins
/// over the `info` default. Later calls are no-ops.
pub fn init_logging(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    let adapter = FileConfigAdapter::from_file(path).map_err(|e| {
        let err = match e {
            BacktestError::Io(io) => BacktestError::ConfigParse {
                file: path.display().to_string(),
                reason: io.to_string(),
            },
            other => other,
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })?;
    init_logging(adapter.get_string("log", "level").as_deref());
    info!(path = %path.display(), "config loaded");
    Ok(adapter)
}

fn run_backtest(
    config_path: &Path,
    strategy_path: Option<&Path>,
    symbol_override: Option<&str>,
    output_path: Option<&Path>,
) -> ExitCode {
    // Stage 1: Load config
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate and build the request
    let (request, open_position) = match build_request(&adapter, strategy_path, symbol_override) {
        Ok(r) => r,
        Err(e) => return report_error(&e),
    };

    // Stage 3: Resolve strategy and data sources
    let strategy_port = match resolve_strategy_source(&adapter, strategy_path) {
        Ok(port) => port,
        Err(e) => return report_error(&e),
    };
    let data_port = match data_adapter(&adapter) {
        Ok(d) => d,
        Err(e) => return report_error(&e),
    };

    // Stage 4: Run
    info!(
        strategy = %request.strategy_id,
        symbol = %request.symbol,
        start = %request.start_date,
        end = %request.end_date,
        "running backtest"
    );
    let result = match run_request(&request, &strategy_port, &data_port, open_position) {
        Ok(r) => r,
        Err(e) => {
            if e.is_validation() {
                eprintln!("hint: `stratsim validate --strategy <file>` lists the parsed rules");
            }
            return report_error(&e);
        }
    };

    // Stage 5: Print summary
    print_summary(&result);

    // Stage 6: Write report
    if let Some(output) = output_path {
        if let Err(e) = JsonReportAdapter::new().write(&result.report, &output.to_string_lossy()) {
            return report_error(&e);
        }
        info!(path = %output.display(), "report written");
    }

    ExitCode::SUCCESS
}

pub fn build_request(
    adapter: &dyn ConfigPort,
    strategy_path: Option<&Path>,
    symbol_override: Option<&str>,
) -> Result<(BacktestRequest, OpenPositionPolicy), BacktestError> {
    let symbol = validate_backtest_config(adapter, symbol_override)?;

    let strategy_id = match strategy_path {
        Some(path) => strategy_stem(path)?,
        None => required(adapter, "strategy", "id")?,
    };

    let request = BacktestRequest {
        strategy_id,
        symbol,
        start_date: config_validation::date(adapter, "start_date")?,
        end_date: config_validation::date(adapter, "end_date")?,
        initial_cash: config_validation::initial_cash(adapter)?,
    };
    Ok((request, config_validation::open_position(adapter)?))
}

/// Strategy store to load the request's id from. An explicit file is served
/// from its own directory by file stem.
fn resolve_strategy_source(
    adapter: &dyn ConfigPort,
    strategy_path: Option<&Path>,
) -> Result<JsonStrategyAdapter, BacktestError> {
    let dir = match strategy_path {
        Some(path) => path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
        None => PathBuf::from(required(adapter, "strategy", "dir")?),
    };
    Ok(JsonStrategyAdapter::new(dir))
}

fn strategy_stem(path: &Path) -> Result<String, BacktestError> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    match path.file_stem() {
        Some(stem) if is_json => Ok(stem.to_string_lossy().into_owned()),
        _ => Err(BacktestError::StrategyLoad {
            id: path.display().to_string(),
            reason: "strategy file must have a .json extension".into(),
        }),
    }
}

fn data_adapter(adapter: &dyn ConfigPort) -> Result<CsvAdapter, BacktestError> {
    let dir = required(adapter, "data", "dir")?;
    Ok(CsvAdapter::new(PathBuf::from(dir)))
}

fn required(adapter: &dyn ConfigPort, section: &str, key: &str) -> Result<String, BacktestError> {
    match adapter.get_string(section, key) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(BacktestError::ConfigMissing {
            section: section.into(),
            key: key.into(),
        }),
    }
}

fn report_error(e: &BacktestError) -> ExitCode {
    eprintln!("error: {e}");
    e.into()
}

fn print_summary(result: &BacktestResult) {
    let report = &result.report;
    println!("=== {} on {} ===", report.strategy_name, report.symbol);
    println!("Total Trades:     {}", report.total_trades);
    println!("Profit/Loss:      {}", report.total_profit_loss);
    println!("Total Return:     {}%", report.total_return_percent);
    println!("Win Rate:         {}%", report.win_rate_percent);
    println!("Max Drawdown:     {}%", report.max_drawdown_percent);
    if let Some(open) = result.record.current_trade() {
        println!(
            "Open Position:    entered at index {} price {}",
            open.entry_index, open.entry_price
        );
    }
}

fn run_validate(strategy_path: &Path) -> ExitCode {
    info!(path = %strategy_path.display(), "validating strategy");
    let definition = match JsonStrategyAdapter::load_file(strategy_path) {
        Ok(d) => d,
        Err(e) => return report_error(&e),
    };

    let rules = match rule_compiler::validate(&definition) {
        Ok(r) => r,
        Err(e) => return report_error(&e),
    };

    println!("Strategy: {}", definition.name);
    for rule in &rules {
        println!("  rule {}: {}", rule.index, rule);
    }
    let skipped = definition.rules.len() - rules.len();
    if skipped > 0 {
        println!("  ({} rule(s) without conditions skipped)", skipped);
    }
    println!("Strategy definition is valid.");
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, symbol_override: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let symbol = match config_validation::symbol(&config, symbol_override) {
        Ok(s) => s,
        Err(e) => return report_error(&e),
    };
    let data_port = match data_adapter(&config) {
        Ok(d) => d,
        Err(e) => return report_error(&e),
    };

    match data_port.data_range(&symbol) {
        Ok(Some((first, last, count))) => {
            println!("{}: {} bars, {} to {}", symbol, count, first, last);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("{}: no data found", symbol);
            ExitCode::SUCCESS
        }
        Err(e) => report_error(&e),
    }
}
