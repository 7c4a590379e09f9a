//! Domain error types.

use std::fmt;

/// Which side of the book a candidate bound belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

/// Top-level error type for the signal engine.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(
        "invalid allocation: long_ratio {long_ratio} and short_ratio {short_ratio} must each be in [0, 1] and sum to at most 1"
    )]
    InvalidAllocation { long_ratio: f64, short_ratio: f64 },

    #[error("invalid {side} candidate bounds: min {min} exceeds max {max}")]
    InvalidBounds { side: Side, min: usize, max: usize },

    #[error("invalid lookback period {period}: periods must be positive bar counts")]
    InvalidPeriod { period: usize },

    #[error("insufficient history for {asset}: have {bars} bars, need {required}")]
    InsufficientHistory {
        asset: String,
        bars: usize,
        required: usize,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SignalError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        SignalError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SignalError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config_missing(section: &str, key: &str) -> Self {
        SignalError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    /// True for every error caused by the caller's configuration rather than its data.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SignalError::ConfigParse { .. }
                | SignalError::ConfigMissing { .. }
                | SignalError::ConfigInvalid { .. }
                | SignalError::InvalidAllocation { .. }
                | SignalError::InvalidBounds { .. }
                | SignalError::InvalidPeriod { .. }
        )
    }
}

impl From<&SignalError> for std::process::ExitCode {
    fn from(err: &SignalError) -> Self {
        let code: u8 = match err {
            SignalError::Io(_) => 1,
            SignalError::ConfigParse { .. }
            | SignalError::ConfigMissing { .. }
            | SignalError::ConfigInvalid { .. }
            | SignalError::InvalidPeriod { .. } => 2,
            SignalError::DataSource { .. } => 3,
            SignalError::InvalidAllocation { .. } | SignalError::InvalidBounds { .. } => 4,
            SignalError::InvalidInput { .. } | SignalError::InsufficientHistory { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
