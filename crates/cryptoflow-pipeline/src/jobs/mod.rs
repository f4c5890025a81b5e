//! Pipeline job implementations.

pub mod aggregate;
pub mod analytics;
pub mod ingest;
pub mod quality;

/// Stable job identifiers recorded on pipeline run rows.
pub const INGEST_JOB_ID: &str = "ingest_market_data";
pub const AGGREGATE_JOB_ID: &str = "transform_aggregates";
pub const ANALYTICS_JOB_ID: &str = "compute_analytics";
pub const QUALITY_JOB_ID: &str = "data_quality_checks";
