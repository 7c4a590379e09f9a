//! Asset universe parsing and history coverage.
//!
//! Parses the configured asset list and reports which requested assets the
//! history provider actually returned.

use crate::domain::price_matrix::PriceMatrix;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in asset list")]
    EmptyToken,

    #[error("duplicate asset: {0}")]
    DuplicateAsset(String),
}

/// Parses `BTCUSDT, ethusdt` style lists, upper-casing each symbol.
pub fn parse_assets(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut assets = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let asset = trimmed.to_uppercase();
        if !seen.insert(asset.clone()) {
            return Err(UniverseError::DuplicateAsset(asset));
        }
        assets.push(asset);
    }

    Ok(assets)
}

/// Requested assets that have no column in `matrix`, in request order.
pub fn missing_assets(requested: &[String], matrix: &PriceMatrix) -> Vec<String> {
    requested
        .iter()
        .filter(|asset| matrix.column(asset).is_none())
        .cloned()
        .collect()
}
