//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_history_adapter::CsvHistoryAdapter;
use crate::adapters::csv_signal_adapter::CsvSignalAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_signal_adapter::JsonSignalAdapter;
use crate::domain::candidates::{CandidateBounds, select_candidates};
use crate::domain::config_validation::{parse_value, read_crossover, validate_strategy_config};
use crate::domain::crossover::SmaCrossover;
use crate::domain::error::SignalError;
use crate::domain::momentum::{MomentumMode, MomentumScores, compute_momentum};
use crate::domain::pipeline::run_strategy;
use crate::domain::price_matrix::PriceMatrix;
use crate::domain::stop_target::{ExecuteFractions, SltpConfig};
use crate::domain::strategy::{
    DEFAULT_FREQUENCY, DEFAULT_LONG_ONLY_RATIO, DEFAULT_LONG_RATIO, DEFAULT_LOOKBACK_HOURS,
    DEFAULT_SHORT_RATIO, DEFAULT_WINDOW, StrategyConfig, StrategyVariant,
    lookback_hours_to_periods, parse_frequency_minutes, parse_list,
};
use crate::domain::universe::parse_assets;
use crate::domain::weights::{AllocationRatios, WeightMethod};
use crate::logging::{LogFormat, init_logging};
use crate::ports::config_port::ConfigPort;
use crate::ports::history_port::HistoryPort;
use crate::ports::signal_port::SignalPort;

#[derive(Parser, Debug)]
#[command(name = "momentum-signals", about = "Multi-period momentum signal generator")]
pub struct Cli {
    /// Log level or filter directives; RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate target weights and stop/target levels
    Signals {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data_dir: PathBuf,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print per-asset momentum scores
    Momentum {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data_dir: PathBuf,
    },
    /// Print rank-selected long and short candidates
    Candidates {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data_dir: PathBuf,
    },
    /// Validate a strategy configuration and print the resolved values
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(&cli.log_level, cli.log_format);

    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            (&e).into()
        }
    }
}

/// Runs one subcommand without touching the global subscriber.
pub fn execute(command: Command) -> Result<(), SignalError> {
    match command {
        Command::Signals {
            config,
            data_dir,
            format,
            output,
        } => run_signals(&config, data_dir, format, output),
        Command::Momentum { config, data_dir } => run_momentum(&config, data_dir),
        Command::Candidates { config, data_dir } => run_candidates(&config, data_dir),
        Command::Validate { config } => run_validate(&config),
    }
}

/// Loads, validates and resolves a strategy file.
pub fn load_config(path: &Path) -> Result<StrategyConfig, SignalError> {
    tracing::info!(path = %path.display(), "loading config");
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_strategy_config(&adapter)?;
    build_strategy_config(&adapter)
}

fn read_or<T: std::str::FromStr>(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, SignalError> {
    Ok(parse_value(adapter, section, key)?.unwrap_or(default))
}

fn read_enum<T: std::str::FromStr<Err = String> + Default>(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<T, SignalError> {
    match adapter.get_trimmed(section, key) {
        None => Ok(T::default()),
        Some(raw) => raw
            .parse()
            .map_err(|reason| SignalError::config_invalid(section, key, reason)),
    }
}

fn read_bound(adapter: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, SignalError> {
    let value: i64 = read_or(adapter, "selection", key, default as i64)?;
    usize::try_from(value).map_err(|_| {
        SignalError::config_invalid("selection", key, format!("{} must be non-negative", key))
    })
}

fn resolve_periods(adapter: &dyn ConfigPort, frequency: &str) -> Result<Vec<usize>, SignalError> {
    if let Some(raw) = adapter.get_trimmed("base", "periods") {
        return parse_list(&raw)
            .map_err(|reason| SignalError::config_invalid("base", "periods", reason));
    }
    let hours = match adapter.get_trimmed("base", "lookback_hours") {
        Some(raw) => parse_list::<f64>(&raw)
            .map_err(|reason| SignalError::config_invalid("base", "lookback_hours", reason))?,
        None => DEFAULT_LOOKBACK_HOURS.to_vec(),
    };
    let bar_minutes = parse_frequency_minutes(frequency)
        .map_err(|reason| SignalError::config_invalid("base", "frequency", reason))?;
    lookback_hours_to_periods(&hours, bar_minutes)
}

/// Builds a typed strategy configuration, applying every default once.
pub fn build_strategy_config(adapter: &dyn ConfigPort) -> Result<StrategyConfig, SignalError> {
    let raw_assets = adapter
        .get_trimmed("base", "assets")
        .ok_or_else(|| SignalError::config_missing("base", "assets"))?;
    let assets = parse_assets(&raw_assets)
        .map_err(|e| SignalError::config_invalid("base", "assets", e.to_string()))?;

    let frequency = adapter
        .get_trimmed("base", "frequency")
        .unwrap_or_else(|| DEFAULT_FREQUENCY.to_string());
    let window: i64 = read_or(adapter, "base", "window", DEFAULT_WINDOW as i64)?;
    let window = usize::try_from(window)
        .map_err(|_| SignalError::config_invalid("base", "window", "window must be at least 1"))?;
    let periods = resolve_periods(adapter, &frequency)?;
    let momentum_mode: MomentumMode = read_enum(adapter, "base", "momentum_mode")?;

    let variant: StrategyVariant = read_enum(adapter, "position", "variant")?;
    let ratios = match variant {
        StrategyVariant::LongOnly => AllocationRatios {
            long_ratio: read_or(adapter, "position", "long_ratio", DEFAULT_LONG_ONLY_RATIO)?,
            short_ratio: 0.0,
        },
        _ => AllocationRatios {
            long_ratio: read_or(adapter, "position", "long_ratio", DEFAULT_LONG_RATIO)?,
            short_ratio: read_or(adapter, "position", "short_ratio", DEFAULT_SHORT_RATIO)?,
        },
    };
    let weight_method: WeightMethod = read_enum(adapter, "position", "weight_method")?;

    let bounds = CandidateBounds {
        long_min: read_bound(adapter, "long_min", 0)?,
        long_max: read_bound(adapter, "long_max", 1)?,
        short_min: read_bound(adapter, "short_min", 0)?,
        short_max: read_bound(adapter, "short_max", 1)?,
    };

    let sltp_defaults = SltpConfig::default();
    let execute_defaults = ExecuteFractions::default();
    let sltp = SltpConfig {
        stop_loss_pct: read_or(adapter, "sltp", "stop_loss_pct", sltp_defaults.stop_loss_pct)?,
        take_profit_pct: read_or(
            adapter,
            "sltp",
            "take_profit_pct",
            sltp_defaults.take_profit_pct,
        )?,
        execute: if adapter.get_bool("sltp", "execute_levels", false) {
            Some(ExecuteFractions {
                take_profit: read_or(
                    adapter,
                    "sltp",
                    "execute_take_profit_fraction",
                    execute_defaults.take_profit,
                )?,
                stop_loss: read_or(
                    adapter,
                    "sltp",
                    "execute_stop_loss_fraction",
                    execute_defaults.stop_loss,
                )?,
            })
        } else {
            None
        },
    };

    let crossover = match variant {
        StrategyVariant::SmaCrossover => read_crossover(adapter)?,
        _ => SmaCrossover::default(),
    };

    let config = StrategyConfig {
        name: adapter
            .get_trimmed("base", "name")
            .unwrap_or_else(|| "Multi Period Momentum".to_string()),
        assets,
        frequency,
        window,
        periods,
        momentum_mode,
        variant,
        ratios,
        weight_method,
        bounds,
        sltp,
        crossover,
    };
    config.validate()?;
    Ok(config)
}

fn fetch_matrix(
    config: &StrategyConfig,
    data_dir: PathBuf,
) -> Result<Option<PriceMatrix>, SignalError> {
    let history = CsvHistoryAdapter::new(data_dir);
    Ok(history
        .get_history(&config.assets, config.window, &config.frequency)?
        .map(|m| m.tail(config.window)))
}

fn scores_for(config: &StrategyConfig, data_dir: PathBuf) -> Result<MomentumScores, SignalError> {
    match fetch_matrix(config, data_dir)? {
        Some(matrix) => compute_momentum(&matrix, &config.periods, config.momentum_mode),
        None => {
            tracing::warn!("no history found, nothing to score");
            Ok(MomentumScores::new())
        }
    }
}

fn run_signals(
    config_path: &Path,
    data_dir: PathBuf,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<(), SignalError> {
    let config = load_config(config_path)?;
    tracing::info!(
        strategy = config.name.as_str(),
        variant = %config.variant,
        assets = config.assets.len(),
        periods = ?config.periods,
        "generating signals"
    );

    let history = CsvHistoryAdapter::new(data_dir);
    let signals = run_strategy(&history, &config)?;

    let publisher: Box<dyn SignalPort> = match format {
        OutputFormat::Csv => Box::new(CsvSignalAdapter::new(output.clone())),
        OutputFormat::Json => Box::new(JsonSignalAdapter::new(output.clone())),
    };
    publisher.publish(&signals)?;

    let destination = output
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "stdout".to_string());
    tracing::info!(
        positions = signals.len(),
        gross_exposure = signals.gross_exposure(),
        output = %destination,
        "signals written"
    );
    Ok(())
}

fn run_momentum(config_path: &Path, data_dir: PathBuf) -> Result<(), SignalError> {
    let config = load_config(config_path)?;
    let scores = scores_for(&config, data_dir)?;
    for (asset, score) in scores.iter() {
        println!("{}\t{:.8}", asset, score);
    }
    Ok(())
}

fn run_candidates(config_path: &Path, data_dir: PathBuf) -> Result<(), SignalError> {
    let config = load_config(config_path)?;
    config.bounds.validate()?;
    let scores = scores_for(&config, data_dir)?;
    let candidates = select_candidates(&scores, config.bounds)?;
    println!("long: {}", candidates.long.join(","));
    println!("short: {}", candidates.short.join(","));
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), SignalError> {
    let config = load_config(config_path)?;
    println!("Configuration is valid.");
    println!("  Name:          {}", config.name);
    println!("  Assets:        {}", config.assets.join(","));
    println!("  Frequency:     {}", config.frequency);
    println!("  Window:        {}", config.window);
    println!(
        "  Periods:       {}",
        config
            .periods
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",")
    );
    println!("  Momentum:      {}", config.momentum_mode);
    println!("  Variant:       {}", config.variant);
    println!(
        "  Ratios:        long {} short {}",
        config.ratios.long_ratio, config.ratios.short_ratio
    );
    if config.variant == StrategyVariant::RankSelection {
        println!("  Weighting:     {}", config.weight_method);
        println!(
            "  Selection:     long {}..{} short {}..{}",
            config.bounds.long_min,
            config.bounds.long_max,
            config.bounds.short_min,
            config.bounds.short_max
        );
    }
    if config.variant == StrategyVariant::SmaCrossover {
        println!(
            "  SMA:           short {} long {}",
            config.crossover.short_period, config.crossover.long_period
        );
    }
    println!(
        "  Stop/target:   sl {} tp {}",
        config.sltp.stop_loss_pct, config.sltp.take_profit_pct
    );
    if let Some(execute) = config.sltp.execute {
        println!(
            "  Execute:       tp x{} sl x{}",
            execute.take_profit, execute.stop_loss
        );
    }
    Ok(())
}
