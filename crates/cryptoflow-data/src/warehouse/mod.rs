//! sqlx repositories over the warehouse star schema.
//!
//! All writes are upsert-by-natural-key or append-only so that jobs
//! overlapping in wall-clock time stay correct without external locking.

pub mod analytics;
pub mod assets;
pub mod bars;
pub mod quality;
pub mod runs;
pub mod snapshots;

pub use assets::NewAsset;
pub use quality::QualityTableSummary;
