//! Price series and the aligned price matrix.
//!
//! A [`PriceMatrix`] is a set of per-asset close-price columns sharing one
//! strictly increasing timestamp axis. A missing observation is a gap
//! (`None`), never an error. Asset order is the order the caller supplied and
//! is the tie-break order for every downstream ranking.

use crate::domain::error::SignalError;
use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: NaiveDateTime,
    pub price: f64,
}

/// Time-ordered observations for one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    asset: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series, rejecting duplicate or out-of-order timestamps.
    pub fn new(asset: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, SignalError> {
        let asset = asset.into();
        if let Some(pair) = points
            .windows(2)
            .find(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(SignalError::invalid_input(format!(
                "timestamps for {} are not strictly increasing at {}",
                asset, pair[1].timestamp
            )));
        }
        Ok(Self { asset, points })
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatrix {
    timestamps: Vec<NaiveDateTime>,
    assets: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl PriceMatrix {
    /// Builds a matrix from a timestamp axis and one column per asset.
    ///
    /// Requires at least one row and one asset, strictly increasing
    /// timestamps, unique asset ids, and every column the length of the axis.
    pub fn new(
        timestamps: Vec<NaiveDateTime>,
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self, SignalError> {
        if timestamps.is_empty() {
            return Err(SignalError::invalid_input("price matrix has no rows"));
        }
        if columns.is_empty() {
            return Err(SignalError::invalid_input("price matrix has no assets"));
        }
        if let Some(pair) = timestamps.windows(2).find(|pair| pair[1] <= pair[0]) {
            return Err(SignalError::invalid_input(format!(
                "timestamps are not strictly increasing at {}",
                pair[1]
            )));
        }

        let mut seen = HashSet::new();
        let mut assets = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        for (asset, column) in columns {
            if column.len() != timestamps.len() {
                return Err(SignalError::invalid_input(format!(
                    "column {} has {} rows, expected {}",
                    asset,
                    column.len(),
                    timestamps.len()
                )));
            }
            if !seen.insert(asset.clone()) {
                return Err(SignalError::invalid_input(format!(
                    "duplicate asset {}",
                    asset
                )));
            }
            assets.push(asset);
            values.push(column);
        }

        Ok(Self {
            timestamps,
            assets,
            columns: values,
        })
    }

    /// Aligns independent series on the union of their timestamps.
    ///
    /// An asset without an observation at a given timestamp gets a gap there.
    pub fn from_series(series: Vec<PriceSeries>) -> Result<Self, SignalError> {
        let timeline: Vec<NaiveDateTime> = series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.timestamp))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let row_of: HashMap<NaiveDateTime, usize> = timeline
            .iter()
            .enumerate()
            .map(|(i, ts)| (*ts, i))
            .collect();

        let columns = series
            .into_iter()
            .map(|s| {
                let mut column = vec![None; timeline.len()];
                for point in &s.points {
                    column[row_of[&point.timestamp]] = Some(point.price);
                }
                (s.asset, column)
            })
            .collect();

        Self::new(timeline, columns)
    }

    /// Number of rows (timestamps).
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn column(&self, asset: &str) -> Option<&[Option<f64>]> {
        self.assets
            .iter()
            .position(|a| a == asset)
            .map(|i| self.columns[i].as_slice())
    }

    /// Columns in asset order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.assets
            .iter()
            .zip(&self.columns)
            .map(|(asset, column)| (asset.as_str(), column.as_slice()))
    }

    /// The most recent `window` rows. A window of zero or one larger than the
    /// matrix returns the whole matrix.
    pub fn tail(&self, window: usize) -> PriceMatrix {
        if window == 0 || window >= self.len() {
            return self.clone();
        }
        let start = self.len() - window;
        PriceMatrix {
            timestamps: self.timestamps[start..].to_vec(),
            assets: self.assets.clone(),
            columns: self.columns.iter().map(|c| c[start..].to_vec()).collect(),
        }
    }

    /// Price in the last row for each asset, in asset order.
    pub fn last_prices(&self) -> Vec<(&str, Option<f64>)> {
        self.columns()
            .map(|(asset, column)| (asset, column.last().copied().flatten()))
            .collect()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.last().copied()
    }
}
