//! Domain types for the CryptoFlow warehouse and streaming path.

pub mod analytics;
pub mod asset;
pub mod bar;
pub mod quality;
pub mod run;
pub mod snapshot;
pub mod tick;

pub use analytics::{CorrelationEntry, VolatilityEntry};
pub use asset::Asset;
pub use bar::DailyBar;
pub use quality::{quality_score, CheckStatus, QualityCheckResult};
pub use run::{PipelineRun, RunStatus};
pub use snapshot::{LatestPrice, MarketSnapshot};
pub use tick::PriceUpdate;
