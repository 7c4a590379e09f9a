//! Momentum calculator.
//!
//! Two modes, both averaged over the configured lookback periods (bar counts):
//!
//! - `Simple`: `last / price[-p-1] - 1` per period, summed and divided by the
//!   number of *configured* periods. Periods without enough history or with a
//!   zero anchor contribute 0 and still count in the denominator.
//! - `Compounded`: per-bar geometric rate `(p[t] / p[t-h])^(1/h) - 1` per
//!   period, averaged, evaluated at every bar from `max(periods)` onwards.
//!   Only the last row becomes the score; if it is undefined the asset is
//!   omitted.
//!
//! Non-finite terms and gaps are zero contributions in both modes.

use crate::domain::error::SignalError;
use crate::domain::price_matrix::PriceMatrix;
use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MomentumMode {
    #[default]
    Simple,
    Compounded,
}

impl fmt::Display for MomentumMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MomentumMode::Simple => write!(f, "simple"),
            MomentumMode::Compounded => write!(f, "compounded"),
        }
    }
}

impl FromStr for MomentumMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(MomentumMode::Simple),
            "compounded" => Ok(MomentumMode::Compounded),
            other => Err(format!(
                "unknown momentum mode '{}', expected simple or compounded",
                other
            )),
        }
    }
}

/// Per-asset momentum, in price-matrix asset order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MomentumScores {
    entries: Vec<(String, f64)>,
}

impl MomentumScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the score for `asset`, keeping its original position if present.
    pub fn insert(&mut self, asset: impl Into<String>, score: f64) {
        let asset = asset.into();
        match self.entries.iter_mut().find(|(a, _)| *a == asset) {
            Some(entry) => entry.1 = score,
            None => self.entries.push((asset, score)),
        }
    }

    pub fn get(&self, asset: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(a, _)| a == asset)
            .map(|(_, score)| *score)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(a, s)| (a.as_str(), *s))
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(a, _)| a.as_str())
    }

    /// Scores restricted to `assets`, keeping this map's order.
    pub fn restricted_to<'a, I>(&self, assets: I) -> MomentumScores
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keep: Vec<&str> = assets.into_iter().collect();
        MomentumScores {
            entries: self
                .entries
                .iter()
                .filter(|(a, _)| keep.contains(&a.as_str()))
                .cloned()
                .collect(),
        }
    }
}

impl FromIterator<(String, f64)> for MomentumScores {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        let mut scores = MomentumScores::new();
        for (asset, score) in iter {
            scores.insert(asset, score);
        }
        scores
    }
}

/// Full per-bar compounded momentum, one column per asset.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentumSeries {
    pub timestamps: Vec<NaiveDateTime>,
    pub columns: Vec<(String, Vec<Option<f64>>)>,
}

impl MomentumSeries {
    /// Scores from the most recent row; assets undefined there are omitted.
    pub fn last_row(&self) -> MomentumScores {
        self.columns
            .iter()
            .filter_map(|(asset, column)| {
                column
                    .last()
                    .copied()
                    .flatten()
                    .map(|score| (asset.clone(), score))
            })
            .collect()
    }
}

fn validate_periods(periods: &[usize]) -> Result<(), SignalError> {
    if periods.is_empty() {
        return Err(SignalError::InvalidPeriod { period: 0 });
    }
    if let Some(&period) = periods.iter().find(|&&p| p == 0) {
        return Err(SignalError::InvalidPeriod { period });
    }
    Ok(())
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Score per asset for the given mode.
pub fn compute_momentum(
    matrix: &PriceMatrix,
    periods: &[usize],
    mode: MomentumMode,
) -> Result<MomentumScores, SignalError> {
    validate_periods(periods)?;

    let scores = match mode {
        MomentumMode::Simple => matrix
            .columns()
            .map(|(asset, column)| (asset.to_string(), simple_return_average(column, periods)))
            .collect(),
        MomentumMode::Compounded => {
            let scores = compounded_momentum_series(matrix, periods)?.last_row();
            if scores.len() < matrix.asset_count() {
                tracing::warn!(
                    bars = matrix.len(),
                    required = periods.iter().max().copied().unwrap_or(0) + 1,
                    omitted = matrix.asset_count() - scores.len(),
                    "compounded momentum undefined for some assets"
                );
            }
            scores
        }
    };

    tracing::debug!(
        mode = %mode,
        assets = matrix.asset_count(),
        bars = matrix.len(),
        scored = scores.len(),
        "momentum computed"
    );
    Ok(scores)
}

fn simple_return_average(column: &[Option<f64>], periods: &[usize]) -> f64 {
    let bars = column.len();
    let last = column.last().copied().flatten();

    let total: f64 = periods
        .iter()
        .map(|&p| {
            if bars <= p {
                return 0.0;
            }
            match (column[bars - p - 1], last) {
                (Some(anchor), Some(last)) if anchor != 0.0 => finite_or_zero(last / anchor - 1.0),
                _ => 0.0,
            }
        })
        .sum();

    total / periods.len() as f64
}

/// Per-bar compounded momentum for every asset.
///
/// Rows before `max(periods)` are `None`.
pub fn compounded_momentum_series(
    matrix: &PriceMatrix,
    periods: &[usize],
) -> Result<MomentumSeries, SignalError> {
    validate_periods(periods)?;

    let columns = matrix
        .columns()
        .map(|(asset, column)| (asset.to_string(), compounded_column(column, periods)))
        .collect();

    Ok(MomentumSeries {
        timestamps: matrix.timestamps().to_vec(),
        columns,
    })
}

fn per_bar_rate(current: Option<f64>, anchor: Option<f64>, exponent: f64) -> f64 {
    match (current, anchor) {
        (Some(current), Some(anchor)) => finite_or_zero((current / anchor).powf(exponent) - 1.0),
        _ => 0.0,
    }
}

fn compounded_column(column: &[Option<f64>], periods: &[usize]) -> Vec<Option<f64>> {
    let bars = column.len();
    let warmup = periods.iter().copied().max().unwrap_or(0);
    if bars <= warmup {
        return vec![None; bars];
    }

    // sums[i] accumulates the row at bar warmup + i
    let mut sums = vec![0.0; bars - warmup];
    for &h in periods {
        let exponent = 1.0 / h as f64;
        let current = &column[warmup..];
        let anchors = &column[warmup - h..bars - h];
        for (sum, (c, a)) in sums.iter_mut().zip(current.iter().zip(anchors)) {
            *sum += per_bar_rate(*c, *a, exponent);
        }
    }

    let count = periods.len() as f64;
    std::iter::repeat_n(None, warmup)
        .chain(sums.into_iter().map(|sum| Some(sum / count)))
        .collect()
}

/// Hard failure for callers that need every asset to cover `max(periods)`.
pub fn require_history(matrix: &PriceMatrix, periods: &[usize]) -> Result<(), SignalError> {
    validate_periods(periods)?;
    let required = periods.iter().copied().max().unwrap_or(0) + 1;

    for (asset, column) in matrix.columns() {
        let bars = column.iter().filter(|p| p.is_some()).count();
        if bars < required {
            return Err(SignalError::InsufficientHistory {
                asset: asset.to_string(),
                bars,
                required,
            });
        }
    }
    Ok(())
}
