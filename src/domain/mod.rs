//! Core domain types and logic.

pub mod config;
pub mod engine;
pub mod error;
pub mod exit_scan;
pub mod explain;
pub mod ledger;
pub mod metrics;
pub mod observation;
pub mod position;
pub mod sentiment;
pub mod signal;
pub mod thresholds;
pub mod universe;
