//! Feed consumer entrypoint.

use cryptoflow_data::RedisBus;
use cryptoflow_stream::{FeedConsumer, StreamConfig};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    cryptoflow_core::logging::init_logging_from_env()?;

    let config = StreamConfig::from_env()?;
    tracing::info!(
        assets = config.assets.len(),
        channel = %config.channel,
        "feed consumer starting"
    );

    let bus = RedisBus::connect(&config.redis_url).await?;
    if !bus.health_check().await? {
        return Err("Redis did not answer PING".into());
    }

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            signal_cancel.cancel();
        }
    });

    let mut consumer = FeedConsumer::new(config, bus);
    consumer.run(cancel).await?;

    Ok(())
}
