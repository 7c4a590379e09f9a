//! Port traits: the collaborators the host supplies.

pub mod config_port;
pub mod history_port;
pub mod signal_port;
