//! API server entrypoint.

use cryptoflow_api::{bridge, routes, ApiConfig, AppState};
use cryptoflow_api::ws::ClientRegistry;
use cryptoflow_data::RedisBus;
use sqlx::PgPool;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    cryptoflow_core::logging::init_logging_from_env()?;

    let config = ApiConfig::from_env()?;
    let pool = PgPool::connect(&config.database_url).await?;
    tracing::info!("database connected");

    let clients = ClientRegistry::new();
    let state = Arc::new(AppState::new(pool, clients.clone()));

    let cancel = CancellationToken::new();

    // The bridge is best-effort: if Redis is down the REST surface
    // still serves, and the bridge keeps retrying.
    let bridge_cancel = cancel.clone();
    let bridge_clients = clients.clone();
    let redis_url = config.redis_url.clone();
    let channel = config.price_channel.clone();
    tokio::spawn(async move {
        loop {
            match RedisBus::connect(&redis_url).await {
                Ok(bus) => {
                    bridge::run(bus, channel.clone(), bridge_clients.clone(), bridge_cancel.clone())
                        .await;
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Redis connect failed, retrying");
                    tokio::select! {
                        _ = bridge_cancel.cancelled() => break,
                        _ = tokio::time::sleep(std::time::Duration::from_secs(5)) => {}
                    }
                }
            }
        }
    });

    let app = routes::app_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.bind_addr();
    tracing::info!(addr = %addr, "API server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await?;

    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
    cancel.cancel();
}
