//! Environment-based stream consumer configuration.

use crate::error::StreamError;
use crate::Result;
use std::collections::BTreeMap;

/// Pub/sub channel carrying normalized price updates.
pub const PRICE_CHANNEL: &str = "crypto:prices";

/// Stream consumer configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Push feed base URL
    pub feed_base_url: String,
    /// Asset slugs subscribed via the URL query
    pub assets: Vec<String>,
    /// Redis URL
    pub redis_url: String,
    /// Pub/sub channel to publish on
    pub channel: String,
    /// Feed slug to published identifier; slugs not listed pass through
    pub symbol_map: BTreeMap<String, String>,
    /// First reconnect delay in seconds
    pub reconnect_base_secs: u64,
    /// Reconnect delay ceiling in seconds
    pub reconnect_cap_secs: u64,
    /// Seconds without any frame before the connection is recycled
    pub idle_timeout_secs: u64,
}

impl StreamConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let redis_url = std::env::var("REDIS_URL").map_err(|_| {
            StreamError::Config("REDIS_URL environment variable is not set".to_string())
        })?;

        let assets = std::env::var("STREAM_ASSETS")
            .unwrap_or_else(|_| default_assets().join(","))
            .split(',')
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();

        Ok(Self {
            feed_base_url: std::env::var("STREAM_FEED_URL")
                .unwrap_or_else(|_| "wss://ws.coincap.io/prices".to_string()),
            assets,
            redis_url,
            channel: std::env::var("STREAM_CHANNEL").unwrap_or_else(|_| PRICE_CHANNEL.to_string()),
            symbol_map: parse_symbol_map(
                &std::env::var("STREAM_SYMBOL_MAP").unwrap_or_default(),
            ),
            reconnect_base_secs: env_var_parse("STREAM_RECONNECT_BASE_SECS", 5),
            reconnect_cap_secs: env_var_parse("STREAM_RECONNECT_CAP_SECS", 60),
            idle_timeout_secs: env_var_parse("STREAM_IDLE_TIMEOUT_SECS", 60),
        })
    }

    /// Full feed URL with the asset subscription query.
    pub fn feed_url(&self) -> String {
        if self.assets.is_empty() {
            self.feed_base_url.clone()
        } else {
            format!("{}?assets={}", self.feed_base_url, self.assets.join(","))
        }
    }
}

/// Parse a `slug=IDENT,slug=IDENT` mapping. Malformed entries are
/// skipped; an empty value means identity mapping.
fn parse_symbol_map(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (slug, ident) = pair.split_once('=')?;
            let slug = slug.trim().to_lowercase();
            let ident = ident.trim().to_string();
            if slug.is_empty() || ident.is_empty() {
                None
            } else {
                Some((slug, ident))
            }
        })
        .collect()
}

fn default_assets() -> Vec<String> {
    ["bitcoin", "ethereum", "solana", "cardano", "dogecoin"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Parse an environment variable, falling back to the default.
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
