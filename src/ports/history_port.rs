//! Price history port trait.
//!
//! Implemented by the host's data provider. The engine asks for a window of
//! bars at a sampling frequency and receives an aligned [`PriceMatrix`].

use crate::domain::error::SignalError;
use crate::domain::price_matrix::PriceMatrix;

pub trait HistoryPort {
    /// The most recent `window` bars for `assets` at `frequency`.
    ///
    /// `Ok(None)` means the provider has no history at all for the request.
    /// Assets the provider does not know are left out of the matrix.
    fn get_history(
        &self,
        assets: &[String],
        window: usize,
        frequency: &str,
    ) -> Result<Option<PriceMatrix>, SignalError>;
}
