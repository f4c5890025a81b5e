//! Push feed consumer.
//!
//! Maintains one WebSocket connection to the upstream price feed,
//! normalizes each frame into the channel wire format and publishes it
//! on the Redis bus. Reconnects forever with capped exponential
//! backoff; the backoff resets after a successful connect.

use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use cryptoflow_core::PriceUpdate;
use cryptoflow_data::RedisBus;
use futures::StreamExt;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Connection lifecycle state, used for logging and health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Disconnected,
    Connecting,
    Connected,
}

/// Why a connection's read loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// Close frame, read error, idle timeout or publish failure;
    /// the consumer reconnects.
    Feed,
    /// Shutdown was requested; the consumer stops.
    Cancelled,
}

/// Where normalized updates are published. The Redis bus in production;
/// tests substitute a recorder.
pub(crate) trait PriceSink {
    async fn send(&self, channel: &str, update: &PriceUpdate) -> Result<()>;
}

impl PriceSink for RedisBus {
    async fn send(&self, channel: &str, update: &PriceUpdate) -> Result<()> {
        self.publish(channel, update).await?;
        Ok(())
    }
}

/// Capped exponential reconnect backoff.
#[derive(Debug, Clone)]
pub struct ReconnectDelay {
    base: Duration,
    cap: Duration,
    current: Duration,
}

impl ReconnectDelay {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            current: base,
        }
    }

    /// Delay to sleep before the next attempt; doubles up to the cap.
    pub fn next(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.cap);
        delay
    }

    /// Reset after a successful connection.
    pub fn reset(&mut self) {
        self.current = self.base;
    }
}

/// Normalize one feed frame into the channel wire format.
///
/// The feed sends a flat JSON object of asset slug to price, with
/// prices as strings or numbers. Slugs found in `symbol_map` are
/// renamed; the rest pass through. Unparsable entries are dropped; a
/// frame with no usable price yields `None` and nothing is published.
pub fn normalize(text: &str, symbol_map: &BTreeMap<String, String>) -> Option<PriceUpdate> {
    let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(text).ok()?;

    let mut prices = BTreeMap::new();
    for (asset, value) in raw {
        let price = match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        };

        match price {
            Some(p) if p.is_finite() && p > 0.0 => {
                let key = symbol_map.get(&asset).cloned().unwrap_or(asset);
                prices.insert(key, p);
            }
            _ => debug!(asset = %asset, "unparsable price dropped"),
        }
    }

    let update = PriceUpdate::new(prices);
    if update.is_empty() {
        None
    } else {
        Some(update)
    }
}

/// Drain one connection until it closes, errors, goes idle or the token
/// is cancelled.
async fn consume<S, P>(
    config: &StreamConfig,
    mut ws: S,
    sink: &P,
    cancel: &CancellationToken,
) -> Disconnect
where
    S: futures::Stream<Item = std::result::Result<Message, tokio_tungstenite::tungstenite::Error>>
        + Unpin,
    P: PriceSink,
{
    let idle = Duration::from_secs(config.idle_timeout_secs);

    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => return Disconnect::Cancelled,
            frame = tokio::time::timeout(idle, ws.next()) => frame,
        };

        match frame {
            Ok(Some(Ok(Message::Text(text)))) => {
                if let Some(update) = normalize(&text, &config.symbol_map) {
                    if let Err(e) = sink.send(&config.channel, &update).await {
                        error!(error = %e, "publish failed, recycling connection");
                        return Disconnect::Feed;
                    }
                    debug!(assets = update.prices.len(), "price update published");
                }
            }
            Ok(Some(Ok(Message::Ping(_)))) => {
                // Pong is answered by tungstenite automatically
                debug!("feed ping");
            }
            Ok(Some(Ok(Message::Close(_)))) => {
                info!("feed closed the connection");
                return Disconnect::Feed;
            }
            Ok(Some(Ok(_))) => {}
            Ok(Some(Err(e))) => {
                error!(error = %e, "feed read error");
                return Disconnect::Feed;
            }
            Ok(None) => {
                info!("feed stream ended");
                return Disconnect::Feed;
            }
            Err(_) => {
                warn!(idle_secs = idle.as_secs(), "feed idle, recycling connection");
                return Disconnect::Feed;
            }
        }
    }
}

/// Long-running feed consumer.
pub struct FeedConsumer {
    config: StreamConfig,
    bus: RedisBus,
    state: FeedState,
}

impl FeedConsumer {
    pub fn new(config: StreamConfig, bus: RedisBus) -> Self {
        Self {
            config,
            bus,
            state: FeedState::Disconnected,
        }
    }

    fn set_state(&mut self, state: FeedState) {
        debug!(from = ?self.state, to = ?state, "feed state transition");
        self.state = state;
    }

    /// Run until cancelled. Connection failures are logged and retried;
    /// only cancellation ends the loop.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        let mut delay = ReconnectDelay::new(
            Duration::from_secs(self.config.reconnect_base_secs),
            Duration::from_secs(self.config.reconnect_cap_secs),
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            self.set_state(FeedState::Connecting);
            let url = self.config.feed_url();
            info!(url = %url, "connecting to price feed");

            match connect_async(url.as_str()).await {
                Ok((ws, _)) => {
                    self.set_state(FeedState::Connected);
                    delay.reset();
                    info!("price feed connected");

                    let reason = consume(&self.config, ws, &self.bus, &cancel).await;
                    self.set_state(FeedState::Disconnected);
                    if reason == Disconnect::Cancelled {
                        break;
                    }
                }
                Err(e) => {
                    self.set_state(FeedState::Disconnected);
                    error!(error = %e, "feed connect failed");
                }
            }

            if cancel.is_cancelled() {
                break;
            }

            let wait = delay.next();
            warn!(delay_secs = wait.as_secs(), "reconnecting after delay");
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }

        info!("feed consumer stopped");
        Ok(())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for StreamError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Feed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    #[test]
    fn normalize_parses_string_prices() {
        let update =
            normalize(r#"{"bitcoin":"43521.12","ethereum":"2234.56"}"#, &identity()).unwrap();
        assert_eq!(update.kind, PriceUpdate::KIND);
        assert_eq!(update.prices["bitcoin"], 43521.12);
        assert_eq!(update.prices["ethereum"], 2234.56);
    }

    #[test]
    fn normalize_parses_numeric_prices() {
        let update = normalize(r#"{"solana":98.7}"#, &identity()).unwrap();
        assert_eq!(update.prices["solana"], 98.7);
    }

    #[test]
    fn normalize_applies_symbol_map() {
        let map = BTreeMap::from([("bitcoin".to_string(), "BTC".to_string())]);
        let update = normalize(r#"{"bitcoin":"43521.12","ethereum":"2234.56"}"#, &map).unwrap();
        assert_eq!(update.prices["BTC"], 43521.12);
        assert_eq!(update.prices["ethereum"], 2234.56);
        assert!(!update.prices.contains_key("bitcoin"));
    }

    #[test]
    fn normalize_drops_garbage_entries() {
        let update = normalize(
            r#"{"bitcoin":"43521.12","broken":"n/a","null":null}"#,
            &identity(),
        )
        .unwrap();
        assert_eq!(update.prices.len(), 1);
        assert!(update.prices.contains_key("bitcoin"));
    }

    #[test]
    fn normalize_rejects_empty_and_non_object_frames() {
        assert!(normalize("{}", &identity()).is_none());
        assert!(normalize(r#"{"bitcoin":"-1"}"#, &identity()).is_none());
        assert!(normalize("[1,2,3]", &identity()).is_none());
        assert!(normalize("not json", &identity()).is_none());
    }

    fn test_config() -> StreamConfig {
        StreamConfig {
            feed_base_url: "wss://ws.coincap.io/prices".to_string(),
            assets: vec!["bitcoin".to_string()],
            redis_url: "redis://localhost".to_string(),
            channel: "crypto:prices".to_string(),
            symbol_map: BTreeMap::new(),
            reconnect_base_secs: 5,
            reconnect_cap_secs: 60,
            idle_timeout_secs: 1,
        }
    }

    struct RecordingSink {
        sent: tokio::sync::Mutex<Vec<(String, PriceUpdate)>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                sent: tokio::sync::Mutex::new(Vec::new()),
            }
        }
    }

    impl PriceSink for RecordingSink {
        async fn send(&self, channel: &str, update: &PriceUpdate) -> Result<()> {
            self.sent
                .lock()
                .await
                .push((channel.to_string(), update.clone()));
            Ok(())
        }
    }

    struct FailingSink;

    impl PriceSink for FailingSink {
        async fn send(&self, _channel: &str, _update: &PriceUpdate) -> Result<()> {
            Err(StreamError::Feed("bus down".to_string()))
        }
    }

    #[tokio::test]
    async fn consume_publishes_frames_then_recycles_on_read_error() {
        let config = test_config();
        let sink = RecordingSink::new();
        let cancel = CancellationToken::new();
        let mut ws = futures::stream::iter(vec![
            Ok(Message::Text(r#"{"bitcoin":"43521.12"}"#.into())),
            Err(tokio_tungstenite::tungstenite::Error::ConnectionClosed),
        ]);

        let reason = consume(&config, &mut ws, &sink, &cancel).await;

        assert_eq!(reason, Disconnect::Feed);
        let sent = sink.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, config.channel);
        assert_eq!(sent[0].1.prices["bitcoin"], 43521.12);
    }

    #[tokio::test]
    async fn consume_recycles_on_close_frame() {
        let config = test_config();
        let sink = RecordingSink::new();
        let cancel = CancellationToken::new();
        let mut ws = futures::stream::iter(vec![Ok(Message::Close(None))]);

        let reason = consume(&config, &mut ws, &sink, &cancel).await;

        assert_eq!(reason, Disconnect::Feed);
        assert!(sink.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn consume_recycles_when_the_stream_ends() {
        let config = test_config();
        let sink = RecordingSink::new();
        let cancel = CancellationToken::new();
        let mut ws = futures::stream::iter(Vec::<
            std::result::Result<Message, tokio_tungstenite::tungstenite::Error>,
        >::new());

        let reason = consume(&config, &mut ws, &sink, &cancel).await;

        assert_eq!(reason, Disconnect::Feed);
    }

    #[tokio::test]
    async fn consume_recycles_when_publishing_fails() {
        let config = test_config();
        let cancel = CancellationToken::new();
        let mut ws = futures::stream::iter(vec![Ok(Message::Text(
            r#"{"bitcoin":"43521.12"}"#.into(),
        ))]);

        let reason = consume(&config, &mut ws, &FailingSink, &cancel).await;

        assert_eq!(reason, Disconnect::Feed);
    }

    #[tokio::test]
    async fn consume_stops_on_cancellation() {
        let config = test_config();
        let sink = RecordingSink::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut ws = futures::stream::pending::<
            std::result::Result<Message, tokio_tungstenite::tungstenite::Error>,
        >();

        let reason = consume(&config, &mut ws, &sink, &cancel).await;

        assert_eq!(reason, Disconnect::Cancelled);
    }

    #[test]
    fn reconnect_delay_doubles_to_the_cap() {
        let mut delay = ReconnectDelay::new(Duration::from_secs(5), Duration::from_secs(60));
        assert_eq!(delay.next(), Duration::from_secs(5));
        assert_eq!(delay.next(), Duration::from_secs(10));
        assert_eq!(delay.next(), Duration::from_secs(20));
        assert_eq!(delay.next(), Duration::from_secs(40));
        assert_eq!(delay.next(), Duration::from_secs(60));
        assert_eq!(delay.next(), Duration::from_secs(60));
    }

    #[test]
    fn reconnect_delay_resets_after_success() {
        let mut delay = ReconnectDelay::new(Duration::from_secs(5), Duration::from_secs(60));
        delay.next();
        delay.next();
        delay.reset();
        assert_eq!(delay.next(), Duration::from_secs(5));
    }
}
