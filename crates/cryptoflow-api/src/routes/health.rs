//! Health check endpoints for load balancers and orchestration.

use crate::state::AppState;
use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadyResponse {
    /// "healthy" | "degraded"
    pub status: String,
    pub version: String,
    pub uptime_secs: i64,
    pub database: String,
    pub ws_clients: usize,
}

/// Liveness probe: `GET /health`.
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness probe: `GET /health/ready`.
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db_up = state.is_db_healthy().await;

    let (status, status_code, database) = if db_up {
        ("healthy", StatusCode::OK, "up")
    } else {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE, "down")
    };

    let response = ReadyResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        database: database.to_string(),
        ws_clients: state.clients.count().await,
    };

    (status_code, Json(response))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn liveness_returns_ok() {
        let app = Router::new().route("/health", get(health_check));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
