//! `txf` binary: `backtest` replays a CSV bar file through one or more
//! configured strategies; `config-hash` prints the canonical config hash
//! without running anything. Grounded on the source CLI's `clap` derive
//! shape and its `key=value` stdout convention.

mod bars_csv;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use txf_backtest::{render_report, BacktestConfig, BacktestDriver, TradingUnit};
use txf_position::PositionManager;

#[derive(Parser)]
#[command(name = "txf")]
#[command(about = "TXF/MXF event-driven backtest engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay historical bars through one or more configured strategies.
    Backtest {
        /// Layered config YAML paths, in merge order.
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Bar CSV file path (symbol,time,open,high,low,close,volume).
        #[arg(long)]
        bars: PathBuf,

        /// Symbol to filter the bar file on.
        #[arg(long)]
        symbol: String,

        /// YYYY-MM-DD.
        #[arg(long)]
        start: String,

        /// YYYY-MM-DD. Ignored if `--days` is given.
        #[arg(long)]
        end: Option<String>,

        /// Run `end = start + days` instead of passing `--end`.
        #[arg(long)]
        days: Option<i64>,

        /// Overrides every unit's `timeframe` label (cosmetic only — bars
        /// are used exactly as read, no resampling is performed).
        #[arg(long)]
        timeframe: Option<String>,

        /// Comma-separated strategy block names to run; defaults to the
        /// config's `active_strategy` alone.
        #[arg(long, value_delimiter = ',')]
        strategies: Vec<String>,

        #[arg(long, default_value_t = 1_000_000)]
        initial_capital: i64,

        #[arg(long, default_value_t = 1)]
        slippage_points: i64,

        #[arg(long)]
        save_report: bool,

        /// Accepted for CLI-surface parity; charting is out of scope here.
        #[arg(long)]
        save_chart: bool,
    },

    /// Compute the layered config hash and print the canonical JSON.
    ConfigHash {
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Backtest {
            config_paths,
            bars,
            symbol,
            start,
            end,
            days,
            timeframe,
            strategies,
            initial_capital,
            slippage_points,
            save_report,
            save_chart,
        } => {
            run_backtest(
                config_paths,
                bars,
                symbol,
                start,
                end,
                days,
                timeframe,
                strategies,
                initial_capital,
                slippage_points,
                save_report,
                save_chart,
            )?;
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(String::as_str).collect();
            let loaded = txf_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_backtest(
    config_paths: Vec<String>,
    bars_path: PathBuf,
    symbol: String,
    start: String,
    end: Option<String>,
    days: Option<i64>,
    timeframe_override: Option<String>,
    strategies: Vec<String>,
    initial_capital: i64,
    slippage_points: i64,
    save_report: bool,
    save_chart: bool,
) -> Result<()> {
    if save_chart {
        println!("note: --save-chart is acknowledged but charting is out of scope; no chart file is written");
    }

    let start_date = NaiveDate::parse_from_str(&start, "%Y-%m-%d").with_context(|| format!("invalid --start date: {start}"))?;
    let end_date = match (&end, days) {
        (_, Some(d)) => start_date + chrono::Duration::days(d),
        (Some(e), None) => NaiveDate::parse_from_str(e, "%Y-%m-%d").with_context(|| format!("invalid --end date: {e}"))?,
        (None, None) => anyhow::bail!("one of --end or --days is required"),
    };
    if end_date < start_date {
        anyhow::bail!("--end must be >= --start");
    }

    let bars = bars_csv::load_bars(&bars_path, &symbol, start_date, end_date)?;
    println!("bars_loaded={} symbol={symbol} range={start_date}..{end_date}", bars.len());

    let path_refs: Vec<&str> = config_paths.iter().map(String::as_str).collect();

    let root_for_hash = txf_config::load_layered_yaml(&path_refs)?;
    println!("config_hash={}", root_for_hash.config_hash);

    let (first_resolved, first_strategy) = if strategies.is_empty() {
        txf_config::load_config(&path_refs)?
    } else {
        txf_config::load_named_strategy(&path_refs, &strategies[0])?
    };

    let mut units = Vec::new();
    let first_name = first_resolved.active_strategy_name.clone();
    units.push(build_unit(&first_name, &symbol, first_resolved, first_strategy, &timeframe_override));

    for name in strategies.iter().skip(1) {
        let (resolved, strategy) = txf_config::load_named_strategy(&path_refs, name)?;
        units.push(build_unit(name, &symbol, resolved, strategy, &timeframe_override));
    }

    let backtest_config = BacktestConfig::new(initial_capital, slippage_points);
    let mut driver = BacktestDriver::new(backtest_config);
    for unit in units {
        driver.add_unit(unit);
    }

    let report = driver.run(&bars);
    let rendered = render_report(&report);
    print!("{rendered}");

    if save_report {
        let out_path = PathBuf::from(format!("{symbol}_backtest_report.txt"));
        std::fs::write(&out_path, &rendered).with_context(|| format!("write report: {}", out_path.display()))?;
        println!("report_path={}", out_path.display());
    }

    Ok(())
}

fn build_unit(
    name: &str,
    symbol: &str,
    resolved: txf_config::ResolvedConfig,
    strategy: Box<dyn txf_strategy::Strategy>,
    timeframe_override: &Option<String>,
) -> TradingUnit {
    let mut pm_config = resolved.position_manager_config;
    if let Some(tf) = timeframe_override {
        pm_config.timeframe = tf.clone();
    }
    let pm = PositionManager::new(pm_config);
    TradingUnit::new(name, symbol, resolved.symbol.current.as_str(), strategy, pm)
}
