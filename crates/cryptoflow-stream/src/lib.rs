//! Real-time price feed consumer.
//!
//! One binary, one responsibility: keep a WebSocket connection to the
//! upstream push feed alive and fan its frames onto the Redis channel
//! in the normalized wire format. The broadcast relay on the API side
//! is the only subscriber.

pub mod config;
pub mod consumer;
pub mod error;

pub use config::StreamConfig;
pub use consumer::{normalize, FeedConsumer, FeedState, ReconnectDelay};
pub use error::{Result, StreamError};
