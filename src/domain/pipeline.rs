//! Signal pipeline: momentum or SMA crossover, optional candidate selection,
//! weights, levels.
//!
//! Each variant has a pure entry point over a [`PriceMatrix`] and a port
//! entry point that fetches history through a [`HistoryPort`] first. Nothing
//! here keeps state between calls.

use crate::domain::candidates::select_candidates;
use crate::domain::crossover::crossover_weights;
use crate::domain::error::SignalError;
use crate::domain::momentum::compute_momentum;
use crate::domain::price_matrix::PriceMatrix;
use crate::domain::stop_target::{SltpConfig, quote_position};
use crate::domain::strategy::{StrategyConfig, StrategyVariant};
use crate::domain::universe::missing_assets;
use crate::domain::weights::{
    Weights, candidate_weights, normalize_weights, normalize_weights_long_only,
};
use crate::ports::history_port::HistoryPort;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// What the execution layer receives for one asset.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PositionSignal {
    pub weight: f64,
    pub stop_price: Option<f64>,
    pub target_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execute_stop_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execute_target_price: Option<f64>,
}

impl PositionSignal {
    pub fn flat() -> Self {
        Self {
            weight: 0.0,
            stop_price: None,
            target_price: None,
            execute_stop_price: None,
            execute_target_price: None,
        }
    }
}

/// Signals per asset, in asset order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalMap {
    entries: Vec<(String, PositionSignal)>,
}

impl SignalMap {
    pub fn get(&self, asset: &str) -> Option<&PositionSignal> {
        self.entries
            .iter()
            .find(|(a, _)| a == asset)
            .map(|(_, signal)| signal)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PositionSignal)> {
        self.entries.iter().map(|(a, s)| (a.as_str(), s))
    }

    pub fn gross_exposure(&self) -> f64 {
        self.entries.iter().map(|(_, s)| s.weight.abs()).sum()
    }
}

impl FromIterator<(String, PositionSignal)> for SignalMap {
    fn from_iter<T: IntoIterator<Item = (String, PositionSignal)>>(iter: T) -> Self {
        SignalMap {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for SignalMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (asset, signal) in &self.entries {
            map.serialize_entry(asset, signal)?;
        }
        map.end()
    }
}

/// Attaches stop/target levels to each weight using the last price in `matrix`.
///
/// Flat weights and assets without a usable last price get no levels.
pub fn attach_levels(
    matrix: &PriceMatrix,
    weights: &Weights,
    sltp: &SltpConfig,
) -> Result<SignalMap, SignalError> {
    sltp.validate()?;
    let last_prices = matrix.last_prices();

    weights
        .iter()
        .map(|(asset, weight)| {
            let entry = last_prices
                .iter()
                .find(|(a, _)| *a == asset)
                .and_then(|(_, price)| *price)
                .filter(|price| price.is_finite() && *price > 0.0);

            let mut signal = PositionSignal {
                weight,
                ..PositionSignal::flat()
            };
            match entry {
                Some(price) => {
                    let quote = quote_position(price, weight, sltp)?;
                    signal.stop_price = quote.levels.map(|l| l.stop_price);
                    signal.target_price = quote.levels.map(|l| l.target_price);
                    signal.execute_stop_price = quote.execute_levels.map(|l| l.stop_price);
                    signal.execute_target_price = quote.execute_levels.map(|l| l.target_price);
                }
                None if weight != 0.0 => {
                    tracing::warn!(asset, weight, "no usable entry price, levels omitted");
                }
                None => {}
            }
            Ok((asset.to_string(), signal))
        })
        .collect()
}

/// Momentum-weighted longs and shorts across the whole universe.
pub fn long_short_signals(
    matrix: &PriceMatrix,
    config: &StrategyConfig,
) -> Result<SignalMap, SignalError> {
    config.validate()?;
    let matrix = matrix.tail(config.window);
    let scores = compute_momentum(&matrix, &config.periods, config.momentum_mode)?;
    let weights = normalize_weights(&scores, config.ratios)?;
    attach_levels(&matrix, &weights, &config.sltp)
}

/// Weights over a bounded set of rank-selected long/short candidates.
pub fn rank_selection_signals(
    matrix: &PriceMatrix,
    config: &StrategyConfig,
) -> Result<SignalMap, SignalError> {
    config.validate()?;
    let matrix = matrix.tail(config.window);
    let scores = compute_momentum(&matrix, &config.periods, config.momentum_mode)?;
    let candidates = select_candidates(&scores, config.bounds)?;
    tracing::debug!(
        long = ?candidates.long,
        short = ?candidates.short,
        "rank selection candidates"
    );
    let weights = candidate_weights(&scores, &candidates, config.ratios, config.weight_method)?;
    attach_levels(&matrix, &weights, &config.sltp)
}

/// Long-only weights; every asset is reported, non-positive momentum at 0.
pub fn long_only_signals(
    matrix: &PriceMatrix,
    config: &StrategyConfig,
) -> Result<SignalMap, SignalError> {
    config.validate()?;
    let matrix = matrix.tail(config.window);
    let scores = compute_momentum(&matrix, &config.periods, config.momentum_mode)?;
    let weights = normalize_weights_long_only(&scores, config.ratios.long_ratio)?;
    attach_levels(&matrix, &weights, &config.sltp)
}

/// Unit positions for assets whose short SMA crossed the long SMA on the
/// last bar. Execute levels are always attached, at the default fractions
/// unless configured.
pub fn sma_crossover_signals(
    matrix: &PriceMatrix,
    config: &StrategyConfig,
) -> Result<SignalMap, SignalError> {
    config.validate()?;
    let matrix = matrix.tail(config.window);
    let weights = crossover_weights(&matrix, config.crossover)?;
    let sltp = SltpConfig {
        execute: Some(config.sltp.execute.unwrap_or_default()),
        ..config.sltp
    };
    attach_levels(&matrix, &weights, &sltp)
}

/// Runs the variant named by `config.variant`.
pub fn generate_signals(
    matrix: &PriceMatrix,
    config: &StrategyConfig,
) -> Result<SignalMap, SignalError> {
    match config.variant {
        StrategyVariant::LongShort => long_short_signals(matrix, config),
        StrategyVariant::RankSelection => rank_selection_signals(matrix, config),
        StrategyVariant::LongOnly => long_only_signals(matrix, config),
        StrategyVariant::SmaCrossover => sma_crossover_signals(matrix, config),
    }
}

fn fetch_history(
    history: &dyn HistoryPort,
    config: &StrategyConfig,
) -> Result<Option<PriceMatrix>, SignalError> {
    let matrix = history.get_history(&config.assets, config.window, &config.frequency)?;
    match &matrix {
        Some(m) => {
            let missing = missing_assets(&config.assets, m);
            if !missing.is_empty() {
                tracing::warn!(?missing, "history provider returned no data for some assets");
            }
            tracing::debug!(assets = m.asset_count(), bars = m.len(), "history fetched");
        }
        None => tracing::warn!(assets = config.assets.len(), "history provider returned no data"),
    }
    Ok(matrix)
}

fn run_with(
    history: &dyn HistoryPort,
    config: &StrategyConfig,
    signals: fn(&PriceMatrix, &StrategyConfig) -> Result<SignalMap, SignalError>,
) -> Result<SignalMap, SignalError> {
    config.validate()?;
    match fetch_history(history, config)? {
        Some(matrix) => signals(&matrix, config),
        None => Ok(SignalMap::default()),
    }
}

pub fn run_long_short(
    history: &dyn HistoryPort,
    config: &StrategyConfig,
) -> Result<SignalMap, SignalError> {
    run_with(history, config, long_short_signals)
}

pub fn run_rank_selection(
    history: &dyn HistoryPort,
    config: &StrategyConfig,
) -> Result<SignalMap, SignalError> {
    run_with(history, config, rank_selection_signals)
}

pub fn run_long_only(
    history: &dyn HistoryPort,
    config: &StrategyConfig,
) -> Result<SignalMap, SignalError> {
    run_with(history, config, long_only_signals)
}

pub fn run_sma_crossover(
    history: &dyn HistoryPort,
    config: &StrategyConfig,
) -> Result<SignalMap, SignalError> {
    run_with(history, config, sma_crossover_signals)
}

/// Fetches history and runs the configured variant. An empty history yields
/// an empty signal map.
pub fn run_strategy(
    history: &dyn HistoryPort,
    config: &StrategyConfig,
) -> Result<SignalMap, SignalError> {
    run_with(history, config, generate_signals)
}
