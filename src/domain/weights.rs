//! Weight normalization.
//!
//! Positive scores share the long ratio in proportion to their size, negative
//! scores share the short ratio in proportion to their magnitude, zero scores
//! get weight 0. If the gross exposure then exceeds 1 every weight is scaled
//! down so it equals 1; otherwise weights are left as they are.
//!
//! Allocation ratios outside `[0, 1]`, or summing above 1, are always
//! rejected with [`SignalError::InvalidAllocation`].

use crate::domain::candidates::CandidateSet;
use crate::domain::error::SignalError;
use crate::domain::momentum::MomentumScores;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationRatios {
    pub long_ratio: f64,
    pub short_ratio: f64,
}

impl AllocationRatios {
    pub fn new(long_ratio: f64, short_ratio: f64) -> Result<Self, SignalError> {
        let ratios = Self {
            long_ratio,
            short_ratio,
        };
        ratios.validate()?;
        Ok(ratios)
    }

    pub fn long_only(long_ratio: f64) -> Result<Self, SignalError> {
        Self::new(long_ratio, 0.0)
    }

    pub fn validate(&self) -> Result<(), SignalError> {
        let in_unit = |r: f64| (0.0..=1.0).contains(&r);
        if !in_unit(self.long_ratio)
            || !in_unit(self.short_ratio)
            || self.long_ratio + self.short_ratio > 1.0
        {
            return Err(SignalError::InvalidAllocation {
                long_ratio: self.long_ratio,
                short_ratio: self.short_ratio,
            });
        }
        Ok(())
    }
}

/// How a rank-selected candidate set is turned into weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightMethod {
    /// Candidate scores normalized like any other score map.
    #[default]
    Momentum,
    /// Each side's ratio split evenly across that side's candidates.
    Equal,
}

impl fmt::Display for WeightMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightMethod::Momentum => write!(f, "momentum"),
            WeightMethod::Equal => write!(f, "equal"),
        }
    }
}

impl FromStr for WeightMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "momentum" => Ok(WeightMethod::Momentum),
            "equal" => Ok(WeightMethod::Equal),
            other => Err(format!(
                "unknown weight method '{}', expected momentum or equal",
                other
            )),
        }
    }
}

/// Signed weights per asset, in score order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Weights {
    entries: Vec<(String, f64)>,
}

impl Weights {
    pub fn get(&self, asset: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(a, _)| a == asset)
            .map(|(_, w)| *w)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(a, w)| (a.as_str(), *w))
    }

    /// Sum of absolute weights.
    pub fn gross_exposure(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w.abs()).sum()
    }

    /// Sum of signed weights.
    pub fn net_exposure(&self) -> f64 {
        self.entries.iter().map(|(_, w)| *w).sum()
    }
}

impl FromIterator<(String, f64)> for Weights {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Weights {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Scales weights down so gross exposure is 1 when it exceeds 1.
///
/// A no-op when gross exposure is already at most 1.
pub fn rescale_exposure(weights: Weights) -> Weights {
    let total = weights.gross_exposure();
    if total <= 1.0 || !total.is_finite() {
        return weights;
    }
    tracing::debug!(gross = total, "rescaling weights to full exposure");
    Weights {
        entries: weights
            .entries
            .into_iter()
            .map(|(asset, w)| (asset, w / total))
            .collect(),
    }
}

fn share(magnitude: f64, total: f64, ratio: f64) -> f64 {
    if total == 0.0 || !total.is_finite() {
        return 0.0;
    }
    let weight = magnitude / total * ratio;
    if weight.is_finite() { weight } else { 0.0 }
}

/// Long/short weights from momentum scores. Every scored asset appears in
/// the output; zero scores get weight 0.
pub fn normalize_weights(
    scores: &MomentumScores,
    ratios: AllocationRatios,
) -> Result<Weights, SignalError> {
    ratios.validate()?;

    let total_long: f64 = scores.iter().map(|(_, s)| s).filter(|s| *s > 0.0).sum();
    let total_short: f64 = scores
        .iter()
        .map(|(_, s)| s)
        .filter(|s| *s < 0.0)
        .map(f64::abs)
        .sum();

    let weights = scores
        .iter()
        .map(|(asset, score)| {
            let weight = if score > 0.0 {
                share(score, total_long, ratios.long_ratio)
            } else if score < 0.0 {
                -share(score.abs(), total_short, ratios.short_ratio)
            } else {
                0.0
            };
            (asset.to_string(), weight)
        })
        .collect();

    Ok(rescale_exposure(weights))
}

/// Long-only weights for spot accounts. Assets with non-positive scores get
/// an explicit 0 and every scored asset appears in the output.
pub fn normalize_weights_long_only(
    scores: &MomentumScores,
    long_ratio: f64,
) -> Result<Weights, SignalError> {
    let ratios = AllocationRatios::long_only(long_ratio)?;

    let total_long: f64 = scores.iter().map(|(_, s)| s).filter(|s| *s > 0.0).sum();

    let weights = scores
        .iter()
        .map(|(asset, score)| {
            let weight = if score > 0.0 {
                share(score, total_long, ratios.long_ratio)
            } else {
                0.0
            };
            (asset.to_string(), weight)
        })
        .collect();

    Ok(rescale_exposure(weights))
}

/// Weights for a rank-selected candidate set.
pub fn candidate_weights(
    scores: &MomentumScores,
    candidates: &CandidateSet,
    ratios: AllocationRatios,
    method: WeightMethod,
) -> Result<Weights, SignalError> {
    match method {
        WeightMethod::Momentum => {
            normalize_weights(&scores.restricted_to(candidates.assets()), ratios)
        }
        WeightMethod::Equal => equal_candidate_weights(candidates, ratios),
    }
}

fn equal_candidate_weights(
    candidates: &CandidateSet,
    ratios: AllocationRatios,
) -> Result<Weights, SignalError> {
    ratios.validate()?;

    let long_each = if candidates.long.is_empty() {
        0.0
    } else {
        ratios.long_ratio / candidates.long.len() as f64
    };
    let short_each = if candidates.short.is_empty() {
        0.0
    } else {
        ratios.short_ratio / candidates.short.len() as f64
    };

    let weights = candidates
        .long
        .iter()
        .map(|asset| (asset.clone(), long_each))
        .chain(
            candidates
                .short
                .iter()
                .map(|asset| (asset.clone(), -short_each)),
        )
        .collect();

    Ok(rescale_exposure(weights))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scores(entries: &[(&str, f64)]) -> MomentumScores {
        entries
            .iter()
            .map(|(asset, score)| (asset.to_string(), *score))
            .collect()
    }

    fn ratios(long: f64, short: f64) -> AllocationRatios {
        AllocationRatios::new(long, short).unwrap()
    }

    #[test]
    fn single_long_and_short_take_full_ratios() {
        let s = scores(&[("A", 0.10), ("B", -0.05)]);
        let w = normalize_weights(&s, ratios(0.7, 0.3)).unwrap();
        assert_relative_eq!(w.get("A").unwrap(), 0.7, epsilon = 1e-12);
        assert_relative_eq!(w.get("B").unwrap(), -0.3, epsilon = 1e-12);
        assert_relative_eq!(w.gross_exposure(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn longs_share_in_proportion() {
        let s = scores(&[("A", 0.3), ("B", 0.1), ("C", -0.2)]);
        let w = normalize_weights(&s, ratios(0.8, 0.2)).unwrap();
        assert_relative_eq!(w.get("A").unwrap(), 0.6, epsilon = 1e-12);
        assert_relative_eq!(w.get("B").unwrap(), 0.2, epsilon = 1e-12);
        assert_relative_eq!(w.get("C").unwrap(), -0.2, epsilon = 1e-12);
    }

    #[test]
    fn partial_allocation_is_not_scaled_up() {
        let s = scores(&[("A", 0.3), ("B", 0.1)]);
        let w = normalize_weights(&s, ratios(0.5, 0.3)).unwrap();
        assert_relative_eq!(w.gross_exposure(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn all_zero_scores_give_zero_weights() {
        let s = scores(&[("A", 0.0), ("B", 0.0)]);
        let w = normalize_weights(&s, ratios(0.7, 0.3)).unwrap();
        assert_eq!(w.len(), 2);
        assert_eq!(w.get("A"), Some(0.0));
        assert_eq!(w.get("B"), Some(0.0));
    }

    #[test]
    fn allocation_sum_above_one_rejected() {
        let s = scores(&[("A", 0.1)]);
        let err = normalize_weights(&s, AllocationRatios {
            long_ratio: 0.8,
            short_ratio: 0.4,
        })
        .unwrap_err();
        assert!(matches!(err, SignalError::InvalidAllocation { .. }));
    }

    #[test]
    fn negative_ratio_rejected() {
        assert!(AllocationRatios::new(-0.1, 0.3).is_err());
        assert!(AllocationRatios::new(0.5, 1.2).is_err());
        assert!(AllocationRatios::new(1.0, 0.0).is_ok());
    }

    #[test]
    fn rescale_caps_gross_exposure() {
        let w: Weights = vec![("A".to_string(), 0.9), ("B".to_string(), -0.6)]
            .into_iter()
            .collect();
        let scaled = rescale_exposure(w);
        assert_relative_eq!(scaled.gross_exposure(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(scaled.get("A").unwrap(), 0.6, epsilon = 1e-12);
        assert_relative_eq!(scaled.get("B").unwrap(), -0.4, epsilon = 1e-12);
    }

    #[test]
    fn rescale_is_noop_when_within_bound() {
        let w: Weights = vec![("A".to_string(), 0.4), ("B".to_string(), -0.3)]
            .into_iter()
            .collect();
        assert_eq!(rescale_exposure(w.clone()), w);
    }

    #[test]
    fn long_only_zeroes_non_positive() {
        let s = scores(&[("A", 0.2), ("B", -0.1), ("C", 0.0), ("D", 0.2)]);
        let w = normalize_weights_long_only(&s, 0.8).unwrap();
        assert_eq!(w.len(), 4);
        assert_relative_eq!(w.get("A").unwrap(), 0.4, epsilon = 1e-12);
        assert_eq!(w.get("B"), Some(0.0));
        assert_eq!(w.get("C"), Some(0.0));
        assert_relative_eq!(w.get("D").unwrap(), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn long_only_rejects_ratio_above_one() {
        let s = scores(&[("A", 0.2)]);
        assert!(matches!(
            normalize_weights_long_only(&s, 1.5),
            Err(SignalError::InvalidAllocation { .. })
        ));
    }

    #[test]
    fn candidate_momentum_weights_only_cover_candidates() {
        let s = scores(&[("A", 0.3), ("B", 0.1), ("C", -0.2), ("D", -0.4)]);
        let set = CandidateSet {
            long: vec!["A".into()],
            short: vec!["D".into()],
        };
        let w = candidate_weights(&s, &set, ratios(0.7, 0.3), WeightMethod::Momentum).unwrap();
        assert_eq!(w.len(), 2);
        assert_relative_eq!(w.get("A").unwrap(), 0.7, epsilon = 1e-12);
        assert_relative_eq!(w.get("D").unwrap(), -0.3, epsilon = 1e-12);
        assert_eq!(w.get("B"), None);
    }

    #[test]
    fn candidate_equal_weights_split_each_side() {
        let set = CandidateSet {
            long: vec!["A".into(), "B".into()],
            short: vec!["C".into()],
        };
        let w = candidate_weights(
            &MomentumScores::new(),
            &set,
            ratios(0.6, 0.4),
            WeightMethod::Equal,
        )
        .unwrap();
        assert_relative_eq!(w.get("A").unwrap(), 0.3, epsilon = 1e-12);
        assert_relative_eq!(w.get("B").unwrap(), 0.3, epsilon = 1e-12);
        assert_relative_eq!(w.get("C").unwrap(), -0.4, epsilon = 1e-12);
    }

    #[test]
    fn weight_method_parses() {
        assert_eq!("Equal".parse::<WeightMethod>(), Ok(WeightMethod::Equal));
        assert_eq!("momentum".parse::<WeightMethod>(), Ok(WeightMethod::Momentum));
        assert!("custom".parse::<WeightMethod>().is_err());
    }
}
