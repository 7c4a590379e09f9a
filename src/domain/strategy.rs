//! Strategy configuration.
//!
//! A fully resolved, typed configuration for one pipeline run. Defaults are
//! applied once when the struct is built (see `cli::build_strategy_config`);
//! the pipeline never looks values up by key.

use crate::domain::candidates::CandidateBounds;
use crate::domain::crossover::SmaCrossover;
use crate::domain::error::SignalError;
use crate::domain::momentum::MomentumMode;
use crate::domain::stop_target::SltpConfig;
use crate::domain::weights::{AllocationRatios, WeightMethod};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_FREQUENCY: &str = "1m";
pub const DEFAULT_WINDOW: usize = 180;
pub const DEFAULT_LOOKBACK_HOURS: [f64; 3] = [1.0, 3.0, 6.0];
pub const DEFAULT_LONG_RATIO: f64 = 0.7;
pub const DEFAULT_LONG_ONLY_RATIO: f64 = 0.8;
pub const DEFAULT_SHORT_RATIO: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyVariant {
    /// Every asset weighted by momentum, longs and shorts.
    #[default]
    LongShort,
    /// Bounded long/short candidates by momentum rank.
    RankSelection,
    /// Spot accounts: positive momentum only, every asset reported.
    LongOnly,
    /// Short/long moving average crossover on the last bar.
    SmaCrossover,
}

impl fmt::Display for StrategyVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyVariant::LongShort => write!(f, "long_short"),
            StrategyVariant::RankSelection => write!(f, "rank_selection"),
            StrategyVariant::LongOnly => write!(f, "long_only"),
            StrategyVariant::SmaCrossover => write!(f, "sma_crossover"),
        }
    }
}

impl FromStr for StrategyVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long_short" => Ok(StrategyVariant::LongShort),
            "rank_selection" => Ok(StrategyVariant::RankSelection),
            "long_only" => Ok(StrategyVariant::LongOnly),
            "sma_crossover" => Ok(StrategyVariant::SmaCrossover),
            other => Err(format!(
                "unknown variant '{}', expected long_short, rank_selection, long_only or sma_crossover",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub name: String,
    pub assets: Vec<String>,
    pub frequency: String,
    pub window: usize,
    /// Lookback periods in bars.
    pub periods: Vec<usize>,
    pub momentum_mode: MomentumMode,
    pub variant: StrategyVariant,
    pub ratios: AllocationRatios,
    pub weight_method: WeightMethod,
    pub bounds: CandidateBounds,
    pub sltp: SltpConfig,
    pub crossover: SmaCrossover,
}

impl StrategyConfig {
    /// Semantic checks for configurations built in code.
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.assets.is_empty() {
            return Err(SignalError::config_missing("base", "assets"));
        }
        parse_frequency_minutes(&self.frequency)
            .map_err(|reason| SignalError::config_invalid("base", "frequency", reason))?;
        if self.window == 0 {
            return Err(SignalError::config_invalid(
                "base",
                "window",
                "window must be at least 1",
            ));
        }
        if self.periods.is_empty() {
            return Err(SignalError::InvalidPeriod { period: 0 });
        }
        if let Some(&period) = self.periods.iter().find(|&&p| p == 0) {
            return Err(SignalError::InvalidPeriod { period });
        }
        self.ratios.validate()?;
        match self.variant {
            StrategyVariant::RankSelection => self.bounds.validate()?,
            StrategyVariant::SmaCrossover => self.crossover.validate()?,
            _ => {}
        }
        self.sltp.validate()?;
        Ok(())
    }

    pub fn max_period(&self) -> usize {
        self.periods.iter().copied().max().unwrap_or(0)
    }
}

/// Bar length in minutes for `Nm`, `Nh` or `Nd`.
///
/// An unrecognised unit falls back to one minute.
pub fn parse_frequency_minutes(frequency: &str) -> Result<u32, String> {
    let freq = frequency.trim().to_lowercase();
    let (count, multiplier) = if let Some(n) = freq.strip_suffix('m') {
        (n, 1)
    } else if let Some(n) = freq.strip_suffix('h') {
        (n, 60)
    } else if let Some(n) = freq.strip_suffix('d') {
        (n, 1440)
    } else {
        return Ok(1);
    };

    let count: u32 = count
        .parse()
        .map_err(|_| format!("invalid frequency '{}'", frequency))?;
    if count == 0 {
        return Err(format!("frequency '{}' must be at least one unit", frequency));
    }
    count
        .checked_mul(multiplier)
        .ok_or_else(|| format!("frequency '{}' is too large", frequency))
}

/// Lookback hours to whole bars: `floor(h * 60 / bar_minutes)`.
pub fn lookback_hours_to_periods(
    hours: &[f64],
    bar_minutes: u32,
) -> Result<Vec<usize>, SignalError> {
    if hours.is_empty() {
        return Err(SignalError::InvalidPeriod { period: 0 });
    }
    hours
        .iter()
        .map(|&h| {
            if !h.is_finite() || h <= 0.0 {
                return Err(SignalError::config_invalid(
                    "base",
                    "lookback_hours",
                    format!("lookback hours must be positive, got {}", h),
                ));
            }
            let bars = (h * 60.0 / bar_minutes as f64).floor() as usize;
            if bars == 0 {
                return Err(SignalError::InvalidPeriod { period: bars });
            }
            Ok(bars)
        })
        .collect()
}

/// Splits a comma separated list and parses each item.
pub fn parse_list<T: FromStr>(input: &str) -> Result<Vec<T>, String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<T>()
                .map_err(|_| format!("invalid list item '{}'", item))
        })
        .collect()
}
