//! Protective stop-loss / take-profit levels.
//!
//! Long: stop = p * (1 - sl), target = p * (1 + tp).
//! Short: stop = p * (1 + sl), target = p * (1 - tp).
//! Flat: no levels.
//! Execute thresholds reuse the same formula with the distances scaled by
//! [`ExecuteFractions`]. All prices are rounded to [`PRICE_DECIMALS`] places.

use crate::domain::error::SignalError;

pub const PRICE_DECIMALS: i32 = 4;

/// Rounds half away from zero to [`PRICE_DECIMALS`] places.
pub fn round_price(value: f64) -> f64 {
    let scale = 10f64.powi(PRICE_DECIMALS);
    (value * scale).round() / scale
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopTarget {
    pub stop_price: f64,
    pub target_price: f64,
}

/// Fractions of the stop/target distance at which execute thresholds sit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecuteFractions {
    pub take_profit: f64,
    pub stop_loss: f64,
}

impl Default for ExecuteFractions {
    fn default() -> Self {
        Self {
            take_profit: 0.9,
            stop_loss: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SltpConfig {
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub execute: Option<ExecuteFractions>,
}

impl Default for SltpConfig {
    fn default() -> Self {
        Self {
            stop_loss_pct: 0.02,
            take_profit_pct: 0.04,
            execute: None,
        }
    }
}

impl SltpConfig {
    pub fn validate(&self) -> Result<(), SignalError> {
        check_fraction("stop_loss_pct", self.stop_loss_pct)?;
        check_fraction("take_profit_pct", self.take_profit_pct)?;
        if let Some(execute) = self.execute {
            check_fraction("execute_take_profit_fraction", execute.take_profit)?;
            check_fraction("execute_stop_loss_fraction", execute.stop_loss)?;
        }
        Ok(())
    }
}

fn check_fraction(key: &str, value: f64) -> Result<(), SignalError> {
    if !value.is_finite() || value < 0.0 {
        return Err(SignalError::config_invalid(
            "sltp",
            key,
            format!("{} must be a non-negative number", key),
        ));
    }
    Ok(())
}

/// Entry price, signed weight and the derived protective levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionQuote {
    pub entry_price: f64,
    pub weight: f64,
    pub levels: Option<StopTarget>,
    pub execute_levels: Option<StopTarget>,
}

/// Stop and target for a position; `None` when the weight is zero.
pub fn compute_stop_target(
    entry_price: f64,
    weight: f64,
    sl_pct: f64,
    tp_pct: f64,
) -> Result<Option<StopTarget>, SignalError> {
    if !entry_price.is_finite() || entry_price <= 0.0 {
        return Err(SignalError::invalid_input(format!(
            "entry price must be positive, got {}",
            entry_price
        )));
    }

    let levels = if weight > 0.0 {
        Some(StopTarget {
            stop_price: round_price(entry_price * (1.0 - sl_pct)),
            target_price: round_price(entry_price * (1.0 + tp_pct)),
        })
    } else if weight < 0.0 {
        Some(StopTarget {
            stop_price: round_price(entry_price * (1.0 + sl_pct)),
            target_price: round_price(entry_price * (1.0 - tp_pct)),
        })
    } else {
        None
    };
    Ok(levels)
}

/// Primary levels plus, when configured, the execute thresholds.
pub fn quote_position(
    entry_price: f64,
    weight: f64,
    config: &SltpConfig,
) -> Result<PositionQuote, SignalError> {
    config.validate()?;

    let levels = compute_stop_target(
        entry_price,
        weight,
        config.stop_loss_pct,
        config.take_profit_pct,
    )?;
    let execute_levels = match config.execute {
        Some(fractions) => compute_stop_target(
            entry_price,
            weight,
            config.stop_loss_pct * fractions.stop_loss,
            config.take_profit_pct * fractions.take_profit,
        )?,
        None => None,
    };

    Ok(PositionQuote {
        entry_price,
        weight,
        levels,
        execute_levels,
    })
}
