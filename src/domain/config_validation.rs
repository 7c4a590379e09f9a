//! Configuration validation.
//!
//! Checks every strategy key before a run so that a bad file fails with the
//! offending section and key rather than deep inside the pipeline.

use crate::domain::crossover::{DEFAULT_SMA_LONG, DEFAULT_SMA_SHORT, SmaCrossover};
use crate::domain::error::SignalError;
use crate::domain::momentum::MomentumMode;
use crate::domain::strategy::{
    DEFAULT_LONG_ONLY_RATIO, DEFAULT_LONG_RATIO, DEFAULT_SHORT_RATIO, StrategyVariant,
    parse_frequency_minutes, parse_list,
};
use crate::domain::universe::parse_assets;
use crate::domain::weights::WeightMethod;
use crate::ports::config_port::ConfigPort;
use std::str::FromStr;

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SignalError> {
    validate_assets(config)?;
    validate_frequency(config)?;
    validate_window(config)?;
    validate_lookback(config)?;
    validate_momentum_mode(config)?;
    let variant = validate_variant(config)?;
    validate_ratios(config, variant)?;
    validate_weight_method(config)?;
    match variant {
        StrategyVariant::RankSelection => validate_selection(config)?,
        StrategyVariant::SmaCrossover => validate_crossover(config)?,
        _ => {}
    }
    validate_sltp(config)?;
    Ok(())
}

/// Parses a present value, `None` when the key is absent or blank.
pub fn parse_value<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, SignalError> {
    match config.get_trimmed(section, key) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
            SignalError::config_invalid(section, key, format!("cannot parse '{}'", raw))
        }),
    }
}

fn validate_assets(config: &dyn ConfigPort) -> Result<(), SignalError> {
    match config.get_trimmed("base", "assets") {
        None => Err(SignalError::config_missing("base", "assets")),
        Some(raw) => parse_assets(&raw)
            .map(|_| ())
            .map_err(|e| SignalError::config_invalid("base", "assets", e.to_string())),
    }
}

fn validate_frequency(config: &dyn ConfigPort) -> Result<(), SignalError> {
    if let Some(raw) = config.get_trimmed("base", "frequency") {
        parse_frequency_minutes(&raw)
            .map_err(|reason| SignalError::config_invalid("base", "frequency", reason))?;
    }
    Ok(())
}

fn validate_window(config: &dyn ConfigPort) -> Result<(), SignalError> {
    if let Some(window) = parse_value::<i64>(config, "base", "window")? {
        if window < 1 {
            return Err(SignalError::config_invalid(
                "base",
                "window",
                "window must be at least 1",
            ));
        }
    }
    Ok(())
}

fn validate_lookback(config: &dyn ConfigPort) -> Result<(), SignalError> {
    if let Some(raw) = config.get_trimmed("base", "periods") {
        let periods = parse_list::<usize>(&raw)
            .map_err(|reason| SignalError::config_invalid("base", "periods", reason))?;
        if periods.is_empty() || periods.contains(&0) {
            return Err(SignalError::config_invalid(
                "base",
                "periods",
                "periods must be positive bar counts",
            ));
        }
    }
    if let Some(raw) = config.get_trimmed("base", "lookback_hours") {
        let hours = parse_list::<f64>(&raw)
            .map_err(|reason| SignalError::config_invalid("base", "lookback_hours", reason))?;
        if hours.is_empty() || hours.iter().any(|h| !h.is_finite() || *h <= 0.0) {
            return Err(SignalError::config_invalid(
                "base",
                "lookback_hours",
                "lookback_hours must be positive numbers",
            ));
        }
    }
    Ok(())
}

fn validate_momentum_mode(config: &dyn ConfigPort) -> Result<(), SignalError> {
    if let Some(raw) = config.get_trimmed("base", "momentum_mode") {
        raw.parse::<MomentumMode>()
            .map_err(|reason| SignalError::config_invalid("base", "momentum_mode", reason))?;
    }
    Ok(())
}

fn validate_variant(config: &dyn ConfigPort) -> Result<StrategyVariant, SignalError> {
    match config.get_trimmed("position", "variant") {
        None => Ok(StrategyVariant::default()),
        Some(raw) => raw
            .parse::<StrategyVariant>()
            .map_err(|reason| SignalError::config_invalid("position", "variant", reason)),
    }
}

fn validate_ratios(config: &dyn ConfigPort, variant: StrategyVariant) -> Result<(), SignalError> {
    let (default_long, default_short) = match variant {
        StrategyVariant::LongOnly => (DEFAULT_LONG_ONLY_RATIO, 0.0),
        _ => (DEFAULT_LONG_RATIO, DEFAULT_SHORT_RATIO),
    };
    let long_ratio = parse_value::<f64>(config, "position", "long_ratio")?.unwrap_or(default_long);
    let short_ratio = match variant {
        StrategyVariant::LongOnly => 0.0,
        _ => parse_value::<f64>(config, "position", "short_ratio")?.unwrap_or(default_short),
    };

    let in_unit = |r: f64| (0.0..=1.0).contains(&r);
    if !in_unit(long_ratio) || !in_unit(short_ratio) || long_ratio + short_ratio > 1.0 {
        return Err(SignalError::InvalidAllocation {
            long_ratio,
            short_ratio,
        });
    }
    Ok(())
}

fn validate_weight_method(config: &dyn ConfigPort) -> Result<(), SignalError> {
    if let Some(raw) = config.get_trimmed("position", "weight_method") {
        raw.parse::<WeightMethod>()
            .map_err(|reason| SignalError::config_invalid("position", "weight_method", reason))?;
    }
    Ok(())
}

fn read_bound(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, SignalError> {
    match parse_value::<i64>(config, "selection", key)? {
        None => Ok(default),
        Some(v) if v < 0 => Err(SignalError::config_invalid(
            "selection",
            key,
            format!("{} must be non-negative", key),
        )),
        Some(v) => Ok(v as usize),
    }
}

fn validate_selection(config: &dyn ConfigPort) -> Result<(), SignalError> {
    let long_min = read_bound(config, "long_min", 0)?;
    let long_max = read_bound(config, "long_max", 1)?;
    let short_min = read_bound(config, "short_min", 0)?;
    let short_max = read_bound(config, "short_max", 1)?;

    crate::domain::candidates::CandidateBounds {
        long_min,
        long_max,
        short_min,
        short_max,
    }
    .validate()
}

fn read_sma_period(
    config: &dyn ConfigPort,
    key: &str,
    default: usize,
) -> Result<usize, SignalError> {
    match parse_value::<i64>(config, "sma", key)? {
        None => Ok(default),
        Some(v) if v < 1 => Err(SignalError::config_invalid(
            "sma",
            key,
            format!("{} must be at least 1", key),
        )),
        Some(v) => Ok(v as usize),
    }
}

/// Resolves the `[sma]` periods, defaulting to 5 and 20 bars.
pub fn read_crossover(config: &dyn ConfigPort) -> Result<SmaCrossover, SignalError> {
    let crossover = SmaCrossover {
        short_period: read_sma_period(config, "sma_short", DEFAULT_SMA_SHORT)?,
        long_period: read_sma_period(config, "sma_long", DEFAULT_SMA_LONG)?,
    };
    crossover.validate()?;
    Ok(crossover)
}

fn validate_crossover(config: &dyn ConfigPort) -> Result<(), SignalError> {
    read_crossover(config).map(|_| ())
}

fn validate_sltp(config: &dyn ConfigPort) -> Result<(), SignalError> {
    for key in [
        "stop_loss_pct",
        "take_profit_pct",
        "execute_take_profit_fraction",
        "execute_stop_loss_fraction",
    ] {
        if let Some(value) = parse_value::<f64>(config, "sltp", key)? {
            if !value.is_finite() || value < 0.0 {
                return Err(SignalError::config_invalid(
                    "sltp",
                    key,
                    format!("{} must be non-negative", key),
                ));
            }
        }
    }
    if let Some(raw) = config.get_trimmed("sltp", "execute_levels") {
        if !matches!(
            raw.to_lowercase().as_str(),
            "true" | "yes" | "1" | "false" | "no" | "0"
        ) {
            return Err(SignalError::config_invalid(
                "sltp",
                "execute_levels",
                "execute_levels must be true or false",
            ));
        }
    }
    Ok(())
}
