//! Core domain types and the signal pipeline.

pub mod error;
pub mod price_matrix;
pub mod momentum;
pub mod candidates;
pub mod weights;
pub mod stop_target;
pub mod crossover;
pub mod strategy;
pub mod universe;
pub mod config_validation;
pub mod pipeline;
