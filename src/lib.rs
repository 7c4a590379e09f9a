//! momentum-signals: multi-period momentum scoring, long/short weight
//! allocation, SMA crossover signals and protective stop/target pricing.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
pub mod logging;
