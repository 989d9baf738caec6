//! Port traits: the seams between the domain and its collaborators.

pub mod config_port;
pub mod data_port;
pub mod price_port;
pub mod signal_store;
pub mod position_store;
