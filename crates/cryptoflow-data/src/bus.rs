//! Redis pub/sub bus.
//!
//! The streaming consumer publishes normalized ticks here; the broadcast
//! relay subscribes. The bus carries opaque JSON strings so the relay
//! can forward payloads verbatim.

use crate::error::{DataError, Result};
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Redis connection wrapper shared by the streaming binaries.
#[derive(Clone)]
pub struct RedisBus {
    client: Client,
    connection: Arc<RwLock<MultiplexedConnection>>,
}

impl RedisBus {
    /// Connect to Redis at the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to Redis...");

        let client = Client::open(url).map_err(|e| DataError::Bus(e.to_string()))?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| DataError::Bus(e.to_string()))?;

        info!("Redis connection established");

        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(connection)),
        })
    }

    /// PING round-trip.
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection.write().await;
        let result: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| DataError::Bus(e.to_string()))?;

        Ok(result == "PONG")
    }

    /// Publish a serializable message on a channel.
    pub async fn publish<T: Serialize>(&self, channel: &str, message: &T) -> Result<()> {
        let json =
            serde_json::to_string(message).map_err(|e| DataError::Serialization(e.to_string()))?;
        self.publish_raw(channel, &json).await
    }

    /// Publish a pre-serialized payload on a channel.
    pub async fn publish_raw(&self, channel: &str, payload: &str) -> Result<()> {
        let mut conn = self.connection.write().await;
        let _: () = conn
            .publish(channel, payload)
            .await
            .map_err(|e| DataError::Bus(e.to_string()))?;

        Ok(())
    }

    /// Dedicated pub/sub connection for subscribing.
    pub async fn get_pubsub(&self) -> Result<redis::aio::PubSub> {
        let pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| DataError::Bus(e.to_string()))?;

        Ok(pubsub)
    }
}
