//! Batch pipeline for the CryptoFlow warehouse.
//!
//! Four jobs, each run under audit tracking:
//! - `ingest`: poll the market source and append snapshot facts
//! - `aggregate`: fold snapshots into daily OHLCV bars
//! - `analytics`: correlation matrix and per-asset risk metrics
//! - `quality`: freshness, completeness and consistency checks

pub mod config;
pub mod error;
pub mod jobs;
pub mod run_tracker;
pub mod stats;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use run_tracker::RunTracker;
pub use stats::JobStats;
