//! Invariants of the scoring and allocation stages over random inputs.

use momentum_signals::domain::candidates::{CandidateBounds, select_candidates};
use momentum_signals::domain::momentum::MomentumScores;
use momentum_signals::domain::stop_target::compute_stop_target;
use momentum_signals::domain::weights::{
    AllocationRatios, WeightMethod, Weights, candidate_weights, normalize_weights,
    normalize_weights_long_only, rescale_exposure,
};
use proptest::prelude::*;

const EPS: f64 = 1e-9;

fn scores_strategy() -> impl Strategy<Value = MomentumScores> {
    prop::collection::vec(-1.0f64..1.0, 1..20).prop_map(|values| {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (format!("A{}", i), v))
            .collect()
    })
}

fn ratios_strategy() -> impl Strategy<Value = AllocationRatios> {
    (0.0f64..=1.0)
        .prop_flat_map(|long| (Just(long), 0.0f64..=(1.0 - long)))
        .prop_map(|(long_ratio, short_ratio)| AllocationRatios {
            long_ratio,
            short_ratio,
        })
        .prop_filter("ratios must sum to at most 1", |r| r.validate().is_ok())
}

fn bounds_strategy() -> impl Strategy<Value = CandidateBounds> {
    (0usize..6, 0usize..6, 0usize..6, 0usize..6).prop_map(|(a, b, c, d)| CandidateBounds {
        long_min: a.min(b),
        long_max: a.max(b),
        short_min: c.min(d),
        short_max: c.max(d),
    })
}

proptest! {
    #[test]
    fn gross_exposure_never_exceeds_one(scores in scores_strategy(), ratios in ratios_strategy()) {
        let weights = normalize_weights(&scores, ratios).unwrap();
        prop_assert!(weights.gross_exposure() <= 1.0 + EPS);
        prop_assert_eq!(weights.len(), scores.len());
    }

    #[test]
    fn weight_sign_follows_score(scores in scores_strategy(), ratios in ratios_strategy()) {
        let weights = normalize_weights(&scores, ratios).unwrap();
        for (asset, score) in scores.iter() {
            let w = weights.get(asset).unwrap();
            if score > 0.0 {
                prop_assert!(w >= 0.0);
            } else if score < 0.0 {
                prop_assert!(w <= 0.0);
            } else {
                prop_assert_eq!(w, 0.0);
            }
        }
    }

    #[test]
    fn long_only_is_complete_and_non_negative(scores in scores_strategy(), long_ratio in 0.0f64..=1.0) {
        let weights = normalize_weights_long_only(&scores, long_ratio).unwrap();
        prop_assert_eq!(weights.len(), scores.len());
        for asset in scores.assets() {
            prop_assert!(weights.get(asset).unwrap() >= 0.0);
        }
        prop_assert!(weights.gross_exposure() <= long_ratio + EPS);
    }

    #[test]
    fn rescale_is_idempotent(scores in scores_strategy(), ratios in ratios_strategy()) {
        let once = normalize_weights(&scores, ratios).unwrap();
        let twice = rescale_exposure(once.clone());
        prop_assert_eq!(once.len(), twice.len());
        for ((a, w1), (b, w2)) in once.iter().zip(twice.iter()) {
            prop_assert_eq!(a, b);
            prop_assert!((w1 - w2).abs() < EPS);
        }
    }

    #[test]
    fn rescale_caps_oversized_books(values in prop::collection::vec(-2.0f64..2.0, 1..10)) {
        let weights: Weights = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (format!("A{}", i), v))
            .collect();
        let before = weights.gross_exposure();
        let rescaled = rescale_exposure(weights);
        prop_assert!(rescaled.gross_exposure() <= 1.0 + EPS);
        if before <= 1.0 {
            prop_assert!((rescaled.gross_exposure() - before).abs() < EPS);
        }
    }

    #[test]
    fn candidates_are_disjoint_and_meet_minimum(scores in scores_strategy(), bounds in bounds_strategy()) {
        let set = select_candidates(&scores, bounds).unwrap();
        for asset in &set.long {
            prop_assert!(!set.short.contains(asset));
        }
        prop_assert!(set.long.len() >= bounds.long_min.min(scores.len()));
        prop_assert!(set.long.len() <= bounds.long_max.max(bounds.long_min));
        prop_assert!(set.short.len() <= bounds.short_max.max(bounds.short_min));
        prop_assert!(set.short.len() >= bounds.short_min.min(scores.len() - set.long.len()));

        let score_of = |asset: &String| scores.get(asset).unwrap();
        for list in [&set.long, &set.short] {
            for pair in list.windows(2) {
                prop_assert!(score_of(&pair[0]) >= score_of(&pair[1]));
            }
        }
        for long in &set.long {
            for short in &set.short {
                prop_assert!(score_of(long) >= score_of(short));
            }
        }
    }

    #[test]
    fn candidate_weights_respect_exposure(
        scores in scores_strategy(),
        bounds in bounds_strategy(),
        ratios in ratios_strategy(),
        equal in any::<bool>(),
    ) {
        let set = select_candidates(&scores, bounds).unwrap();
        let method = if equal { WeightMethod::Equal } else { WeightMethod::Momentum };
        let weights = candidate_weights(&scores, &set, ratios, method).unwrap();
        prop_assert!(weights.gross_exposure() <= 1.0 + EPS);
        for (asset, _) in weights.iter() {
            prop_assert!(set.contains(asset));
        }
    }

    #[test]
    fn stop_target_brackets_entry(
        entry in 1.0f64..100_000.0,
        weight in -1.0f64..1.0,
        sl in 0.001f64..0.5,
        tp in 0.001f64..0.5,
    ) {
        let levels = compute_stop_target(entry, weight, sl, tp).unwrap();
        match levels {
            None => prop_assert_eq!(weight, 0.0),
            Some(l) if weight > 0.0 => {
                prop_assert!(l.stop_price < entry && entry < l.target_price);
            }
            Some(l) => {
                prop_assert!(l.target_price < entry && entry < l.stop_price);
            }
        }
    }
}
