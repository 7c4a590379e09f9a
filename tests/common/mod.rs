#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use momentum_signals::domain::candidates::CandidateBounds;
use momentum_signals::domain::crossover::SmaCrossover;
use momentum_signals::domain::error::SignalError;
use momentum_signals::domain::momentum::MomentumMode;
use momentum_signals::domain::price_matrix::PriceMatrix;
use momentum_signals::domain::stop_target::SltpConfig;
use momentum_signals::domain::strategy::{StrategyConfig, StrategyVariant};
use momentum_signals::domain::weights::{AllocationRatios, WeightMethod};
use momentum_signals::ports::history_port::HistoryPort;
use std::cell::RefCell;

/// In-memory history provider that records every request.
pub struct MockHistoryPort {
    pub matrix: Option<PriceMatrix>,
    pub error: Option<String>,
    pub requests: RefCell<Vec<(Vec<String>, usize, String)>>,
}

impl MockHistoryPort {
    pub fn new() -> Self {
        Self {
            matrix: None,
            error: None,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_matrix(mut self, matrix: PriceMatrix) -> Self {
        self.matrix = Some(matrix);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl HistoryPort for MockHistoryPort {
    fn get_history(
        &self,
        assets: &[String],
        window: usize,
        frequency: &str,
    ) -> Result<Option<PriceMatrix>, SignalError> {
        self.requests
            .borrow_mut()
            .push((assets.to_vec(), window, frequency.to_string()));
        if let Some(reason) = &self.error {
            return Err(SignalError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self.matrix.clone())
    }
}

pub fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 11, 13)
        .unwrap()
        .and_hms_opt(4, 0, 0)
        .unwrap()
}

pub fn minute_timestamps(bars: usize) -> Vec<NaiveDateTime> {
    (0..bars)
        .map(|i| start_time() + Duration::minutes(i as i64))
        .collect()
}

/// `bars` prices moving linearly from `from` to `to`.
pub fn linear(from: f64, to: f64, bars: usize) -> Vec<f64> {
    (0..bars)
        .map(|i| from + (to - from) * i as f64 / (bars - 1) as f64)
        .collect()
}

pub fn make_matrix(columns: &[(&str, Vec<f64>)]) -> PriceMatrix {
    let bars = columns[0].1.len();
    PriceMatrix::new(
        minute_timestamps(bars),
        columns
            .iter()
            .map(|(asset, prices)| {
                (
                    asset.to_string(),
                    prices.iter().map(|p| Some(*p)).collect(),
                )
            })
            .collect(),
    )
    .unwrap()
}

pub fn make_config(assets: &[&str], variant: StrategyVariant) -> StrategyConfig {
    let ratios = match variant {
        StrategyVariant::LongOnly => AllocationRatios {
            long_ratio: 0.8,
            short_ratio: 0.0,
        },
        _ => AllocationRatios {
            long_ratio: 0.7,
            short_ratio: 0.3,
        },
    };
    StrategyConfig {
        name: "Multi Period Momentum".into(),
        assets: assets.iter().map(|a| a.to_string()).collect(),
        frequency: "1m".into(),
        window: 180,
        periods: vec![60],
        momentum_mode: MomentumMode::Simple,
        variant,
        ratios,
        weight_method: WeightMethod::Momentum,
        bounds: CandidateBounds {
            long_min: 0,
            long_max: 1,
            short_min: 0,
            short_max: 1,
        },
        sltp: SltpConfig::default(),
        crossover: SmaCrossover::default(),
    }
}

/// Writes `<asset>.csv` with minute timestamps and a close column.
pub fn write_history_csv(dir: &std::path::Path, asset: &str, prices: &[f64]) {
    let mut content = String::from("timestamp,close\n");
    for (ts, price) in minute_timestamps(prices.len()).iter().zip(prices) {
        content.push_str(&format!("{},{}\n", ts.format("%Y-%m-%d %H:%M:%S"), price));
    }
    std::fs::write(dir.join(format!("{}.csv", asset)), content).unwrap();
}
