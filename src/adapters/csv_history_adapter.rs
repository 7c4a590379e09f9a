//! CSV price history adapter.
//!
//! One file per asset in a base directory, `<ASSET>_<frequency>.csv` or
//! `<ASSET>.csv`, with a header row naming a timestamp column and a `close`
//! column.

use crate::domain::error::SignalError;
use crate::domain::price_matrix::{PriceMatrix, PricePoint, PriceSeries};
use crate::ports::history_port::HistoryPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

const TIMESTAMP_COLUMNS: [&str; 4] = ["timestamp", "datetime", "date", "time"];
const PRICE_COLUMNS: [&str; 2] = ["close", "price"];
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%z"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

pub struct CsvHistoryAdapter {
    base_path: PathBuf,
}

fn data_source(reason: String) -> SignalError {
    SignalError::DataSource { reason }
}

/// Accepts offset timestamps (`2025-11-13 04:01:00+00:00`, RFC 3339), which
/// are converted to UTC, then `YYYY-MM-DD HH:MM:SS`, the `T` separated form,
/// minutes only, or a bare date.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .ok()
        .or_else(|| {
            OFFSET_FORMATS
                .iter()
                .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
        })
        .map(|dt| dt.naive_utc())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl CsvHistoryAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, asset: &str, frequency: &str) -> Option<PathBuf> {
        [
            self.base_path.join(format!("{}_{}.csv", asset, frequency)),
            self.base_path.join(format!("{}.csv", asset)),
        ]
        .into_iter()
        .find(|p| p.is_file())
    }

    fn read_series(&self, asset: &str, path: &Path) -> Result<PriceSeries, SignalError> {
        let content = fs::read_to_string(path)
            .map_err(|e| data_source(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| data_source(format!("CSV header error in {}: {}", path.display(), e)))?
            .clone();

        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
        };
        let ts_idx = find(&TIMESTAMP_COLUMNS[..]).unwrap_or(0);
        let price_idx = find(&PRICE_COLUMNS[..]).ok_or_else(|| {
            data_source(format!("{}: no close column in header", path.display()))
        })?;

        let mut points = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result
                .map_err(|e| data_source(format!("CSV parse error in {}: {}", path.display(), e)))?;

            let ts_str = record.get(ts_idx).unwrap_or_default();
            let timestamp = parse_timestamp(ts_str).ok_or_else(|| {
                data_source(format!(
                    "{} row {}: invalid timestamp '{}'",
                    path.display(),
                    line + 1,
                    ts_str
                ))
            })?;

            let price_str = record.get(price_idx).unwrap_or_default().trim();
            if price_str.is_empty() {
                continue;
            }
            let price: f64 = price_str.parse().map_err(|e| {
                data_source(format!(
                    "{} row {}: invalid close value: {}",
                    path.display(),
                    line + 1,
                    e
                ))
            })?;

            points.push(PricePoint { timestamp, price });
        }

        points.sort_by_key(|p| p.timestamp);
        let before = points.len();
        // keep the last row written for a repeated timestamp
        points.reverse();
        points.dedup_by_key(|p| p.timestamp);
        points.reverse();
        if points.len() < before {
            tracing::warn!(
                asset,
                dropped = before - points.len(),
                "duplicate timestamps dropped"
            );
        }

        PriceSeries::new(asset, points)
    }
}

impl HistoryPort for CsvHistoryAdapter {
    fn get_history(
        &self,
        assets: &[String],
        window: usize,
        frequency: &str,
    ) -> Result<Option<PriceMatrix>, SignalError> {
        let mut series = Vec::new();

        for asset in assets {
            let Some(path) = self.csv_path(asset, frequency) else {
                tracing::warn!(asset = asset.as_str(), "no history file found");
                continue;
            };
            let full = self.read_series(asset, &path)?;
            if full.is_empty() {
                tracing::warn!(asset = asset.as_str(), "history file has no prices");
                continue;
            }
            let skip = full.len().saturating_sub(window);
            let recent = full.points()[skip..].to_vec();
            tracing::debug!(
                asset = asset.as_str(),
                path = %path.display(),
                bars = recent.len(),
                "history loaded"
            );
            series.push(PriceSeries::new(asset.as_str(), recent)?);
        }

        if series.is_empty() {
            return Ok(None);
        }
        PriceMatrix::from_series(series).map(Some)
    }
}
