//! # CryptoFlow Data
//!
//! Data access for the CryptoFlow pipeline:
//! - `provider`: upstream REST market source with throttling and retry
//! - `warehouse`: sqlx repositories over the PostgreSQL star schema
//! - `bus`: Redis pub/sub bus bridging the streaming path

pub mod bus;
pub mod error;
pub mod provider;
pub mod warehouse;

pub use bus::RedisBus;
pub use error::{DataError, Result};
pub use provider::{CoinGeckoClient, CoinGeckoConfig, MarketTicker};
