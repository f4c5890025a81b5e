//! Environment-based pipeline configuration.

use crate::error::PipelineError;
use crate::Result;
use cryptoflow_data::CoinGeckoConfig;

/// Full pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Database URL
    pub database_url: String,
    /// Upstream market source settings
    pub source: CoinGeckoConfig,
    /// Ingestion job settings
    pub ingest: IngestConfig,
    /// Aggregation job settings
    pub aggregate: AggregateConfig,
    /// Analytics job settings
    pub analytics: AnalyticsConfig,
    /// Quality check thresholds
    pub quality: QualityConfig,
}

/// Ingestion job settings.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Number of top-ranked assets to poll each cycle
    pub target_assets: usize,
}

/// Aggregation job settings.
#[derive(Debug, Clone)]
pub struct AggregateConfig {
    /// Days of snapshot history re-aggregated each run
    pub window_days: i64,
}

/// Analytics job settings.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Lookback windows in days
    pub windows: Vec<i32>,
    /// Top-ranked assets included in the correlation matrix
    pub correlation_assets: i64,
    /// Minimum common return observations for a correlation
    pub min_overlap: usize,
    /// Annualization factor (crypto trades every day)
    pub periods_per_year: f64,
}

/// Quality check thresholds.
#[derive(Debug, Clone)]
pub struct QualityConfig {
    /// Hours of history scanned by the row-level checks
    pub lookback_hours: i64,
    /// Data age in minutes before freshness degrades to warning
    pub freshness_warn_minutes: i64,
    /// Data age in minutes before freshness fails
    pub freshness_fail_minutes: i64,
    /// Asset coverage percentage at or above which completeness passes
    pub completeness_pass_pct: f64,
    /// Coverage percentage at or above which completeness only warns
    pub completeness_warn_pct: f64,
    /// Null-priced rows tolerated as a warning
    pub null_warn_max: i64,
    /// Absolute percent move between consecutive snapshots flagged
    /// as an anomaly
    pub anomaly_threshold_pct: f64,
    /// Anomalies tolerated as a warning
    pub anomaly_warn_max: i64,
    /// Inconsistent bars tolerated as a warning
    pub ohlcv_warn_max: i64,
    /// Days of bars scanned by the consistency check
    pub ohlcv_lookback_days: i64,
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            PipelineError::Config("DATABASE_URL environment variable is not set".to_string())
        })?;

        let defaults = CoinGeckoConfig::default();
        let source = CoinGeckoConfig {
            base_url: std::env::var("COINGECKO_BASE_URL").unwrap_or(defaults.base_url),
            timeout_secs: env_var_parse("COINGECKO_TIMEOUT_SECS", defaults.timeout_secs),
            min_request_interval_ms: env_var_parse(
                "COINGECKO_MIN_INTERVAL_MS",
                defaults.min_request_interval_ms,
            ),
            max_retries: env_var_parse("COINGECKO_MAX_RETRIES", defaults.max_retries),
            initial_backoff_secs: env_var_parse(
                "COINGECKO_INITIAL_BACKOFF_SECS",
                defaults.initial_backoff_secs,
            ),
            backoff_factor: env_var_parse("COINGECKO_BACKOFF_FACTOR", defaults.backoff_factor),
            page_size: env_var_parse("COINGECKO_PAGE_SIZE", defaults.page_size),
        };

        Ok(Self {
            database_url,
            source,
            ingest: IngestConfig {
                target_assets: env_var_parse("INGEST_TARGET_ASSETS", 50),
            },
            aggregate: AggregateConfig {
                window_days: env_var_parse("AGGREGATE_WINDOW_DAYS", 90),
            },
            analytics: AnalyticsConfig {
                windows: parse_windows(
                    &std::env::var("ANALYTICS_WINDOWS").unwrap_or_else(|_| "30,90".to_string()),
                ),
                correlation_assets: env_var_parse("ANALYTICS_CORRELATION_ASSETS", 15),
                min_overlap: env_var_parse("ANALYTICS_MIN_OVERLAP", 5),
                periods_per_year: env_var_parse("ANALYTICS_PERIODS_PER_YEAR", 365.0),
            },
            quality: QualityConfig {
                lookback_hours: env_var_parse("QUALITY_LOOKBACK_HOURS", 24),
                freshness_warn_minutes: env_var_parse("QUALITY_FRESHNESS_WARN_MINUTES", 30),
                freshness_fail_minutes: env_var_parse("QUALITY_FRESHNESS_FAIL_MINUTES", 60),
                completeness_pass_pct: env_var_parse("QUALITY_COMPLETENESS_PASS_PCT", 90.0),
                completeness_warn_pct: env_var_parse("QUALITY_COMPLETENESS_WARN_PCT", 70.0),
                null_warn_max: env_var_parse("QUALITY_NULL_WARN_MAX", 5),
                anomaly_threshold_pct: env_var_parse("QUALITY_ANOMALY_THRESHOLD_PCT", 50.0),
                anomaly_warn_max: env_var_parse("QUALITY_ANOMALY_WARN_MAX", 3),
                ohlcv_warn_max: env_var_parse("QUALITY_OHLCV_WARN_MAX", 5),
                ohlcv_lookback_days: env_var_parse("QUALITY_OHLCV_LOOKBACK_DAYS", 7),
            },
        })
    }
}

/// Parse a comma-separated window list; malformed entries are dropped.
/// An empty result falls back to the standard 30/90 pair.
fn parse_windows(raw: &str) -> Vec<i32> {
    let mut windows: Vec<i32> = raw
        .split(',')
        .filter_map(|w| w.trim().parse().ok())
        .filter(|w| *w > 0)
        .collect();

    windows.sort_unstable();
    windows.dedup();

    if windows.is_empty() {
        vec![30, 90]
    } else {
        windows
    }
}

/// Parse an environment variable, falling back to the default.
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
