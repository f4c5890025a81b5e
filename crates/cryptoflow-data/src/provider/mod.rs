//! Upstream market data providers.

pub mod coingecko;

pub use coingecko::{CoinGeckoClient, CoinGeckoConfig, MarketTicker};
