//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod signal;
pub mod scoring;
pub mod position;
pub mod sweep;
pub mod scan;
pub mod config_validation;
pub mod error;
