//! Environment-based server configuration.

use crate::error::ApiErrorResponse;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Redis URL, for the price bridge
    pub redis_url: String,
    /// Pub/sub channel the bridge subscribes to
    pub price_channel: String,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ApiErrorResponse> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            ApiErrorResponse::new("CONFIG", "DATABASE_URL environment variable is not set")
        })?;
        let redis_url = std::env::var("REDIS_URL").map_err(|_| {
            ApiErrorResponse::new("CONFIG", "REDIS_URL environment variable is not set")
        })?;

        Ok(Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            database_url,
            redis_url,
            price_channel: std::env::var("STREAM_CHANNEL")
                .unwrap_or_else(|_| "crypto:prices".to_string()),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
