//! # CryptoFlow API
//!
//! REST read surface over the warehouse plus the WebSocket price
//! relay:
//! - `routes`: market, analytics, pipeline and quality endpoints
//! - `ws`: relay client registry and upgrade handler
//! - `bridge`: Redis price channel to relay fan-out

pub mod bridge;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod ws;

pub use config::ApiConfig;
pub use error::{ApiErrorResponse, ApiResult};
pub use state::AppState;
