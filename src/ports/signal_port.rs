//! Signal publication port trait.

use crate::domain::error::SignalError;
use crate::domain::pipeline::SignalMap;

/// Downstream consumer of weights and protective levels.
pub trait SignalPort {
    fn publish(&self, signals: &SignalMap) -> Result<(), SignalError>;
}
