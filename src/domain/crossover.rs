//! Simple moving average crossover.
//!
//! A buy fires when the short average moves from below the long average on
//! the previous bar to above it on the last bar; a sell is the mirror image.
//! Each crossing asset takes a unit position in its direction and the book is
//! then capped at a gross exposure of 1.

use crate::domain::error::SignalError;
use crate::domain::price_matrix::PriceMatrix;
use crate::domain::weights::{Weights, rescale_exposure};

pub const DEFAULT_SMA_SHORT: usize = 5;
pub const DEFAULT_SMA_LONG: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmaCrossover {
    pub short_period: usize,
    pub long_period: usize,
}

impl Default for SmaCrossover {
    fn default() -> Self {
        Self {
            short_period: DEFAULT_SMA_SHORT,
            long_period: DEFAULT_SMA_LONG,
        }
    }
}

impl SmaCrossover {
    pub fn validate(&self) -> Result<(), SignalError> {
        for (key, period) in [
            ("sma_short", self.short_period),
            ("sma_long", self.long_period),
        ] {
            if period == 0 {
                return Err(SignalError::config_invalid(
                    "sma",
                    key,
                    format!("{} must be at least 1", key),
                ));
            }
        }
        if self.short_period >= self.long_period {
            return Err(SignalError::config_invalid(
                "sma",
                "sma_short",
                format!(
                    "sma_short ({}) must be below sma_long ({})",
                    self.short_period, self.long_period
                ),
            ));
        }
        Ok(())
    }

    /// Bars needed before a crossing can be detected on the last bar.
    pub fn required_bars(&self) -> usize {
        self.short_period.max(self.long_period) + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cross {
    Buy,
    Sell,
}

impl Cross {
    pub fn direction(self) -> f64 {
        match self {
            Cross::Buy => 1.0,
            Cross::Sell => -1.0,
        }
    }
}

/// Rolling mean over `period` bars; `None` during warm-up and wherever the
/// window contains a gap.
pub fn sma(column: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; column.len()];
    }

    let mut values = Vec::with_capacity(column.len());
    let mut sum = 0.0;
    let mut gaps = 0usize;

    for (i, price) in column.iter().enumerate() {
        match price {
            Some(p) => sum += p,
            None => gaps += 1,
        }
        if i >= period {
            match column[i - period] {
                Some(p) => sum -= p,
                None => gaps -= 1,
            }
        }

        let valid = i + 1 >= period && gaps == 0;
        values.push(if valid { Some(sum / period as f64) } else { None });
    }

    values
}

/// Crossing on the last bar of `column`, if any.
pub fn detect_cross(column: &[Option<f64>], params: SmaCrossover) -> Option<Cross> {
    let bars = column.len();
    if bars < params.required_bars() {
        return None;
    }

    let short = sma(column, params.short_period);
    let long = sma(column, params.long_period);
    let prev_short = short[bars - 2]?;
    let prev_long = long[bars - 2]?;
    let curr_short = short[bars - 1]?;
    let curr_long = long[bars - 1]?;

    if prev_short < prev_long && curr_short > curr_long {
        Some(Cross::Buy)
    } else if prev_short > prev_long && curr_short < curr_long {
        Some(Cross::Sell)
    } else {
        None
    }
}

/// Unit positions for every asset crossing on the last bar, rescaled so the
/// gross exposure stays within 1. Assets without a crossing are left out.
pub fn crossover_weights(
    matrix: &PriceMatrix,
    params: SmaCrossover,
) -> Result<Weights, SignalError> {
    params.validate()?;

    let raw: Weights = matrix
        .columns()
        .filter_map(|(asset, column)| {
            detect_cross(column, params).map(|cross| (asset.to_string(), cross.direction()))
        })
        .collect();

    tracing::debug!(
        assets = matrix.asset_count(),
        crossings = raw.len(),
        short = params.short_period,
        long = params.long_period,
        "sma crossover evaluated"
    );
    Ok(rescale_exposure(raw))
}
