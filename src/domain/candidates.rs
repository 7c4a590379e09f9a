//! Rank-based candidate selection.
//!
//! Assets are ranked by score descending with a stable sort, so ties keep
//! the score map's (price-matrix) order. The top `long_max` become long
//! candidates and the bottom `short_max` short candidates; an asset in both
//! stays long. Either list shorter than its minimum is backfilled from the
//! unassigned assets, longs from the head of the ranking and shorts from the
//! tail.

use crate::domain::error::{Side, SignalError};
use crate::domain::momentum::MomentumScores;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CandidateBounds {
    pub long_min: usize,
    pub long_max: usize,
    pub short_min: usize,
    pub short_max: usize,
}

impl CandidateBounds {
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.long_min > self.long_max {
            return Err(SignalError::InvalidBounds {
                side: Side::Long,
                min: self.long_min,
                max: self.long_max,
            });
        }
        if self.short_min > self.short_max {
            return Err(SignalError::InvalidBounds {
                side: Side::Short,
                min: self.short_min,
                max: self.short_max,
            });
        }
        Ok(())
    }
}

/// Disjoint long and short candidate lists, each in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    pub long: Vec<String>,
    pub short: Vec<String>,
}

impl CandidateSet {
    pub fn contains(&self, asset: &str) -> bool {
        self.long.iter().chain(&self.short).any(|a| a == asset)
    }

    pub fn len(&self) -> usize {
        self.long.len() + self.short.len()
    }

    pub fn is_empty(&self) -> bool {
        self.long.is_empty() && self.short.is_empty()
    }

    /// Long candidates first, then short.
    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.long.iter().chain(&self.short).map(String::as_str)
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    // NaN ranks last
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Ranks `scores` and selects bounded long/short candidate lists.
pub fn select_candidates(
    scores: &MomentumScores,
    bounds: CandidateBounds,
) -> Result<CandidateSet, SignalError> {
    bounds.validate()?;

    let mut ranked: Vec<(&str, f64)> = scores.iter().collect();
    ranked.sort_by(|a, b| descending(a.1, b.1));
    let ranked: Vec<&str> = ranked.into_iter().map(|(asset, _)| asset).collect();

    let mut long: Vec<&str> = ranked.iter().take(bounds.long_max).copied().collect();
    let tail_start = ranked.len().saturating_sub(bounds.short_max);
    let mut short: Vec<&str> = ranked[tail_start..]
        .iter()
        .copied()
        .filter(|asset| !long.contains(asset))
        .collect();

    if long.len() < bounds.long_min {
        let needed = bounds.long_min - long.len();
        let backfill: Vec<&str> = ranked
            .iter()
            .copied()
            .filter(|asset| !long.contains(asset) && !short.contains(asset))
            .take(needed)
            .collect();
        long.extend(backfill);
    }

    if short.len() < bounds.short_min {
        let needed = bounds.short_min - short.len();
        let backfill: Vec<&str> = ranked
            .iter()
            .rev()
            .copied()
            .filter(|asset| !long.contains(asset) && !short.contains(asset))
            .take(needed)
            .collect();
        short.extend(backfill);
    }

    tracing::debug!(
        ranked = ranked.len(),
        long = long.len(),
        short = short.len(),
        "candidates selected"
    );

    Ok(CandidateSet {
        long: long.into_iter().map(str::to_string).collect(),
        short: short.into_iter().map(str::to_string).collect(),
    })
}
